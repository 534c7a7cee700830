use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use envelope_core::model::{FailurePolicy, FamilyCategory, FamilyTypeSelector};
use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub footprint: FootprintConfig,
    #[serde(default)]
    pub levels: LevelNamesConfig,
    #[serde(default)]
    pub openings: OpeningsConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `ENVELOPE_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("ENVELOPE_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 建筑轮廓尺寸，单位毫米。
#[derive(Debug, Clone, Deserialize)]
pub struct FootprintConfig {
    #[serde(default = "FootprintConfig::default_width")]
    pub width_mm: f64,
    #[serde(default = "FootprintConfig::default_depth")]
    pub depth_mm: f64,
}

impl FootprintConfig {
    fn default_width() -> f64 {
        10_000.0
    }

    fn default_depth() -> f64 {
        5_000.0
    }
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            width_mm: Self::default_width(),
            depth_mm: Self::default_depth(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelNamesConfig {
    #[serde(default = "LevelNamesConfig::default_base")]
    pub base: String,
    #[serde(default = "LevelNamesConfig::default_top")]
    pub top: String,
}

impl LevelNamesConfig {
    fn default_base() -> String {
        "Level 1".to_string()
    }

    fn default_top() -> String {
        "Level 2".to_string()
    }
}

impl Default for LevelNamesConfig {
    fn default() -> Self {
        Self {
            base: Self::default_base(),
            top: Self::default_top(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FamilyTypeConfig {
    pub type_name: String,
    pub family_name: String,
}

impl FamilyTypeConfig {
    fn new(type_name: &str, family_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            family_name: family_name.to_string(),
        }
    }

    pub fn selector(&self, category: FamilyCategory) -> FamilyTypeSelector {
        FamilyTypeSelector::new(category, self.type_name.clone(), self.family_name.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningsConfig {
    #[serde(default = "OpeningsConfig::default_door")]
    pub door: FamilyTypeConfig,
    #[serde(default = "OpeningsConfig::default_window")]
    pub window: FamilyTypeConfig,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl OpeningsConfig {
    fn default_door() -> FamilyTypeConfig {
        FamilyTypeConfig::new("0915 x 2134mm", "Single-Flush")
    }

    fn default_window() -> FamilyTypeConfig {
        FamilyTypeConfig::new("0915 x 1220mm", "Fixed")
    }

    #[inline]
    pub fn door_selector(&self) -> FamilyTypeSelector {
        self.door.selector(FamilyCategory::Door)
    }

    #[inline]
    pub fn window_selector(&self) -> FamilyTypeSelector {
        self.window.selector(FamilyCategory::Window)
    }
}

impl Default for OpeningsConfig {
    fn default() -> Self {
        Self {
            door: Self::default_door(),
            window: Self::default_window(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostLevelConfig {
    pub name: String,
    #[serde(default)]
    pub elevation_mm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntryConfig {
    pub category: FamilyCategory,
    pub type_name: String,
    pub family_name: String,
}

impl CatalogEntryConfig {
    pub fn selector(&self) -> FamilyTypeSelector {
        FamilyTypeSelector::new(self.category, self.type_name.clone(), self.family_name.clone())
    }
}

/// 内存宿主文档的初始内容：标高、族目录与墙厚。
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(default = "HostConfig::default_wall_thickness")]
    pub wall_thickness_mm: f64,
    #[serde(default = "HostConfig::default_joined_ends")]
    pub joined_ends: bool,
    #[serde(default = "HostConfig::default_levels")]
    pub levels: Vec<HostLevelConfig>,
    #[serde(default = "HostConfig::default_catalog")]
    pub catalog: Vec<CatalogEntryConfig>,
}

impl HostConfig {
    fn default_wall_thickness() -> f64 {
        200.0
    }

    fn default_joined_ends() -> bool {
        true
    }

    fn default_levels() -> Vec<HostLevelConfig> {
        vec![
            HostLevelConfig {
                name: "Level 1".to_string(),
                elevation_mm: 0.0,
            },
            HostLevelConfig {
                name: "Level 2".to_string(),
                elevation_mm: 3_000.0,
            },
        ]
    }

    fn default_catalog() -> Vec<CatalogEntryConfig> {
        let door = OpeningsConfig::default_door();
        let window = OpeningsConfig::default_window();
        vec![
            CatalogEntryConfig {
                category: FamilyCategory::Door,
                type_name: door.type_name,
                family_name: door.family_name,
            },
            CatalogEntryConfig {
                category: FamilyCategory::Window,
                type_name: window.type_name,
                family_name: window.family_name,
            },
        ]
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            wall_thickness_mm: Self::default_wall_thickness(),
            joined_ends: Self::default_joined_ends(),
            levels: Self::default_levels(),
            catalog: Self::default_catalog(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_describe_reference_building() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.footprint.width_mm, 10_000.0);
        assert_eq!(cfg.footprint.depth_mm, 5_000.0);
        assert_eq!(cfg.levels.base, "Level 1");
        assert_eq!(cfg.levels.top, "Level 2");
        assert_eq!(cfg.openings.failure_policy, FailurePolicy::Partial);
        assert_eq!(cfg.host.levels.len(), 2);
        assert_eq!(cfg.host.levels[1].elevation_mm, 3_000.0);
        assert_eq!(cfg.host.catalog[0].selector(), cfg.openings.door_selector());
        assert_eq!(cfg.host.catalog[1].selector(), cfg.openings.window_selector());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = tempfile::NamedTempFile::new().expect("create temp file");
        let cfg = AppConfig::from_file(file.path()).expect("load empty config");
        assert_eq!(cfg.footprint.width_mm, 10_000.0);
        assert!(cfg.host.joined_ends);
        assert_eq!(cfg.host.catalog.len(), 2);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [footprint]
            width_mm = 12000.0

            [levels]
            base = "Уровень 1"
            top = "Уровень 2"

            [openings]
            failure_policy = "all_or_nothing"
            window = {{ type_name = "0610 x 1830mm", family_name = "Casement" }}

            [host]
            wall_thickness_mm = 300.0
            joined_ends = false
            levels = [
                {{ name = "Уровень 1" }},
                {{ name = "Уровень 2", elevation_mm = 4000.0 }},
            ]
            catalog = [
                {{ category = "window", type_name = "0610 x 1830mm", family_name = "Casement" }},
            ]
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.footprint.width_mm, 12_000.0);
        assert_eq!(cfg.footprint.depth_mm, 5_000.0);
        assert_eq!(cfg.levels.base, "Уровень 1");
        assert_eq!(cfg.openings.failure_policy, FailurePolicy::AllOrNothing);
        assert_eq!(cfg.openings.door.family_name, "Single-Flush");
        assert_eq!(
            cfg.openings.window_selector(),
            FamilyTypeSelector::window("0610 x 1830mm", "Casement")
        );
        assert_eq!(cfg.host.wall_thickness_mm, 300.0);
        assert!(!cfg.host.joined_ends);
        assert_eq!(cfg.host.levels[0].elevation_mm, 0.0);
        assert_eq!(cfg.host.levels[1].elevation_mm, 4_000.0);
        assert_eq!(cfg.host.catalog.len(), 1);
        assert_eq!(cfg.host.catalog[0].category, FamilyCategory::Window);
    }

    #[test]
    fn failure_policy_key_selects_all_or_nothing() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[openings]\nfailure_policy = \"all_or_nothing\"").unwrap();
        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.openings.failure_policy, FailurePolicy::AllOrNothing);
        assert_eq!(cfg.openings.door_selector(), OpeningsConfig::default().door_selector());
    }

    #[test]
    fn unknown_failure_policy_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[openings]\nfailure_policy = \"best_effort\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn shipped_default_file_matches_builtin_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/default.toml");
        let cfg = AppConfig::from_file(&path).expect("load shipped config");
        let builtin = AppConfig::default();
        assert_eq!(cfg.openings.failure_policy, builtin.openings.failure_policy);
        assert_eq!(cfg.openings.window_selector(), builtin.openings.window_selector());
        assert_eq!(cfg.host.wall_thickness_mm, builtin.host.wall_thickness_mm);
        assert_eq!(cfg.host.levels.len(), builtin.host.levels.len());
        assert_eq!(cfg.host.catalog.len(), builtin.host.catalog.len());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[footprint]\nwidth_mm = \"wide\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("absent.toml")));
    }
}
