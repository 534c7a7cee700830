use std::path::PathBuf;

use envelope_config::{AppConfig, ConfigError};
use envelope_engine::{EnvelopeGenerator, FailurePolicy, GenerationOptions};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod demo_host;
mod report;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut json_output = false;
    let mut policy_override: Option<FailurePolicy> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json_output = true,
            "--all-or-nothing" => policy_override = Some(FailurePolicy::AllOrNothing),
            "--partial" => policy_override = Some(FailurePolicy::Partial),
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let (config, source) = load_configuration(config_override);
    init_logging(&config);
    info!("启动建筑外壳生成演示");
    log_configuration(&config, &source);

    let mut options = generation_options(&config);
    if let Some(policy) = policy_override {
        options.failure_policy = policy;
    }

    let mut host = demo_host::build(&config.host);
    let generator = EnvelopeGenerator::new(options);
    match generator.generate(&mut host) {
        Ok(report) => {
            if !report.is_complete() {
                warn!(failures = report.failures.len(), "部分洞口未能放置");
            }
            if json_output {
                if let Err(err) = report::print_json(&report) {
                    error!(error = %err, "序列化生成报告失败");
                    std::process::exit(1);
                }
            } else {
                report::print_text(&report, &host);
            }
        }
        Err(err) => {
            error!(error = %err, "建筑外壳生成失败");
            std::process::exit(1);
        }
    }
}

fn generation_options(config: &AppConfig) -> GenerationOptions {
    GenerationOptions {
        width_mm: config.footprint.width_mm,
        depth_mm: config.footprint.depth_mm,
        base_level: config.levels.base.clone(),
        top_level: config.levels.top.clone(),
        door: config.openings.door_selector(),
        window: config.openings.window_selector(),
        failure_policy: config.openings.failure_policy,
    }
}

/// 配置来源，日志初始化后再输出。
#[derive(Debug)]
enum ConfigSource {
    File(PathBuf),
    Discovered,
    Fallback(ConfigError),
}

fn load_configuration(override_path: Option<PathBuf>) -> (AppConfig, ConfigSource) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(&path).map(|cfg| (cfg, ConfigSource::File(path))),
        None => AppConfig::discover().map(|cfg| (cfg, ConfigSource::Discovered)),
    };
    loaded.unwrap_or_else(|err| (AppConfig::default(), ConfigSource::Fallback(err)))
}

fn log_configuration(config: &AppConfig, source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => info!(path = %path.display(), "已加载指定配置"),
        ConfigSource::Discovered => debug!("已加载自动发现的配置"),
        ConfigSource::Fallback(err) => match err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "加载配置失败，改用内建的参考建筑"
                );
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载配置失败，改用内建的参考建筑");
            }
        },
    }
    info!(
        width_mm = config.footprint.width_mm,
        depth_mm = config.footprint.depth_mm,
        base = %config.levels.base,
        top = %config.levels.top,
        door = %config.openings.door_selector(),
        window = %config.openings.window_selector(),
        policy = ?config.openings.failure_policy,
        "建筑外壳参数"
    );
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
