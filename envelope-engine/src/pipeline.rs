pub use envelope_core::model::FailurePolicy;
use envelope_core::model::{
    ElementId, FamilyCategory, FamilyTypeSelector, Footprint, LevelId, OpeningPlacement,
    OpeningRole,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::host::HostDocument;
use crate::layout::{BuiltWall, UnconfiguredWall, build_footprint, layout_walls};
use crate::levels::LevelTable;
use crate::openings::{place_door, place_window, resolve_family_type};

pub const WALLS_UNIT: &str = "Create walls";
pub const DOOR_UNIT: &str = "Create door";
pub const WINDOWS_UNIT: &str = "Create windows";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub width_mm: f64,
    pub depth_mm: f64,
    pub base_level: String,
    pub top_level: String,
    pub door: FamilyTypeSelector,
    pub window: FamilyTypeSelector,
    pub failure_policy: FailurePolicy,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            width_mm: 10_000.0,
            depth_mm: 5_000.0,
            base_level: "Level 1".to_string(),
            top_level: "Level 2".to_string(),
            door: FamilyTypeSelector::door("0915 x 2134mm", "Single-Flush"),
            window: FamilyTypeSelector::window("0915 x 1220mm", "Fixed"),
            failure_policy: FailurePolicy::Partial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOpening {
    pub instance: ElementId,
    pub placement: OpeningPlacement,
}

/// 被跳过的洞口及原因。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpeningFailure {
    pub host_wall: ElementId,
    pub selector: FamilyTypeSelector,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub footprint: Footprint,
    pub base_level: LevelId,
    pub top_level: LevelId,
    pub walls: Vec<BuiltWall>,
    pub openings: Vec<PlacedOpening>,
    pub failures: Vec<OpeningFailure>,
}

impl GenerationReport {
    pub fn doors(&self) -> impl Iterator<Item = &PlacedOpening> {
        self.openings
            .iter()
            .filter(|opening| opening.placement.category() == FamilyCategory::Door)
    }

    pub fn windows(&self) -> impl Iterator<Item = &PlacedOpening> {
        self.openings
            .iter()
            .filter(|opening| opening.placement.category() == FamilyCategory::Window)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 建筑外壳生成流水线：轮廓 → 墙 → 门 → 窗。
///
/// 每个阶段在独立的原子单元中执行，前一单元提交后才开始下一单元。
#[derive(Debug, Clone, Default)]
pub struct EnvelopeGenerator {
    options: GenerationOptions,
}

impl EnvelopeGenerator {
    pub fn new(options: GenerationOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn generate<H>(&self, host: &mut H) -> Result<GenerationReport, EngineError>
    where
        H: HostDocument + ?Sized,
    {
        let options = &self.options;
        let levels = host.list_levels();
        let table = LevelTable::new(&levels)?;
        let base = table.resolve(&options.base_level)?;
        let top = table.resolve(&options.top_level)?;
        info!(
            base = %base.name,
            top = %top.name,
            policy = ?options.failure_policy,
            "开始生成建筑外壳"
        );

        let footprint = build_footprint(options.width_mm, options.depth_mm)?;
        let segments = layout_walls(&footprint, base, top);

        if options.failure_policy == FailurePolicy::AllOrNothing {
            resolve_family_type(host, &options.door)?;
            resolve_family_type(host, &options.window)?;
        }

        let walls = within_unit(host, WALLS_UNIT, |host| {
            segments
                .into_iter()
                .map(|segment| {
                    UnconfiguredWall::create(&mut *host, segment)?.assign_top_level(&mut *host)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;
        info!(count = walls.len(), "墙体已创建");

        let mut openings = Vec::new();
        let mut failures = Vec::new();

        within_unit(host, DOOR_UNIT, |host| {
            for wall in walls.iter().filter(|wall| wall.role() == OpeningRole::DoorHost) {
                let result = place_door(host, wall, base.id, &options.door);
                self.record(host, wall, &options.door, result, &mut openings, &mut failures)?;
            }
            Ok(())
        })?;

        within_unit(host, WINDOWS_UNIT, |host| {
            for wall in walls.iter().filter(|wall| wall.role() == OpeningRole::WindowHost) {
                let result = place_window(host, wall, base.id, &options.window);
                self.record(host, wall, &options.window, result, &mut openings, &mut failures)?;
            }
            Ok(())
        })?;

        info!(
            walls = walls.len(),
            openings = openings.len(),
            failures = failures.len(),
            "建筑外壳生成完成"
        );

        Ok(GenerationReport {
            footprint,
            base_level: base.id,
            top_level: top.id,
            walls,
            openings,
            failures,
        })
    }

    /// 实例化放置结果；在 `Partial` 策略下仅族类型解析失败会被记录并跳过。
    fn record<H>(
        &self,
        host: &mut H,
        wall: &BuiltWall,
        selector: &FamilyTypeSelector,
        result: Result<OpeningPlacement, EngineError>,
        openings: &mut Vec<PlacedOpening>,
        failures: &mut Vec<OpeningFailure>,
    ) -> Result<(), EngineError>
    where
        H: HostDocument + ?Sized,
    {
        match result {
            Ok(placement) => {
                let instance = host.create_family_instance(
                    placement.insertion_point,
                    placement.family_type,
                    placement.host_wall,
                    placement.level,
                )?;
                debug!(
                    instance = instance.get(),
                    wall = wall.id.get(),
                    x = placement.insertion_point.x(),
                    y = placement.insertion_point.y(),
                    z = placement.insertion_point.z(),
                    "洞口已放置"
                );
                openings.push(PlacedOpening {
                    instance,
                    placement,
                });
                Ok(())
            }
            Err(err @ EngineError::FamilyTypeNotFound { .. })
                if self.options.failure_policy == FailurePolicy::Partial =>
            {
                warn!(wall = wall.id.get(), error = %err, "洞口放置失败，已跳过");
                failures.push(OpeningFailure {
                    host_wall: wall.id,
                    selector: selector.clone(),
                    reason: err.to_string(),
                });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// 在命名原子单元内执行 `body`：成功则提交，失败则回滚并返回原错误。
fn within_unit<H, T, F>(host: &mut H, label: &str, body: F) -> Result<T, EngineError>
where
    H: HostDocument + ?Sized,
    F: FnOnce(&mut H) -> Result<T, EngineError>,
{
    host.begin_atomic_unit(label)?;
    match body(host) {
        Ok(value) => {
            host.commit_atomic_unit()
                .map_err(|source| EngineError::HostCommit {
                    label: label.to_string(),
                    source,
                })?;
            debug!(unit = label, "原子单元已提交");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = host.rollback_atomic_unit() {
                warn!(unit = label, error = %rollback, "回滚原子单元失败");
            }
            Err(err)
        }
    }
}
