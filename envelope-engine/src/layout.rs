use envelope_core::model::{ElementId, Footprint, Level, OpeningRole, WallSegment};
use envelope_core::units::to_internal_length;
use serde::Serialize;
use tracing::debug;

use crate::errors::EngineError;
use crate::host::HostDocument;

/// 由毫米宽度、深度生成以原点为中心的闭合矩形轮廓。
///
/// 点序固定为 (-dx,-dy) → (dx,-dy) → (dx,dy) → (-dx,dy) → (-dx,-dy)，
/// 墙段顺序与门所在墙都依赖这一顺序。
pub fn build_footprint(width_mm: f64, depth_mm: f64) -> Result<Footprint, EngineError> {
    for (name, value) in [("width", width_mm), ("depth", depth_mm)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(EngineError::Precondition(format!(
                "footprint {name} must be positive, got {value}"
            )));
        }
    }
    let dx = to_internal_length(width_mm) / 2.0;
    let dy = to_internal_length(depth_mm) / 2.0;
    Ok(Footprint::from_half_extents(dx, dy))
}

/// 沿轮廓相邻点对生成墙段；第一段承载门，其余承载窗。
pub fn layout_walls(
    footprint: &Footprint,
    base_level: &Level,
    top_level: &Level,
) -> Vec<WallSegment> {
    footprint
        .edges()
        .enumerate()
        .map(|(index, (start, end))| WallSegment {
            start,
            end,
            base_level: base_level.id,
            top_level: top_level.id,
            opening_role: if index == 0 {
                OpeningRole::DoorHost
            } else {
                OpeningRole::WindowHost
            },
        })
        .collect()
}

/// 已按底部标高创建、尚未设置顶部标高的墙体。
///
/// 宿主模型中顶部标高是创建后才能设置的参数，因此创建分两步：
/// `create` 之后必须调用 `assign_top_level` 才能得到 [`BuiltWall`]。
#[derive(Debug)]
#[must_use = "a wall without its top level is incomplete; call `assign_top_level`"]
pub struct UnconfiguredWall {
    id: ElementId,
    segment: WallSegment,
}

impl UnconfiguredWall {
    pub fn create<H>(host: &mut H, segment: WallSegment) -> Result<Self, EngineError>
    where
        H: HostDocument + ?Sized,
    {
        let id = host.create_wall(segment.start, segment.end, segment.base_level)?;
        Ok(Self { id, segment })
    }

    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn assign_top_level<H>(self, host: &mut H) -> Result<BuiltWall, EngineError>
    where
        H: HostDocument + ?Sized,
    {
        host.set_wall_top_level(self.id, self.segment.top_level)?;
        debug!(
            wall = self.id.get(),
            base_level = self.segment.base_level.get(),
            top_level = self.segment.top_level.get(),
            "墙体标高已设置"
        );
        Ok(BuiltWall {
            id: self.id,
            segment: self.segment,
        })
    }
}

/// 已在宿主中完整创建的墙体及其布局描述。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltWall {
    pub id: ElementId,
    pub segment: WallSegment,
}

impl BuiltWall {
    #[inline]
    pub fn role(&self) -> OpeningRole {
        self.segment.opening_role
    }
}

#[cfg(test)]
mod tests {
    use envelope_core::geometry::Point3;
    use envelope_core::model::LevelId;

    use super::*;
    use crate::memory::MemoryHost;

    fn levels() -> (Level, Level) {
        (
            Level::new(LevelId::new(1), "Level 1", 0.0),
            Level::new(LevelId::new(2), "Level 2", to_internal_length(3_000.0)),
        )
    }

    #[test]
    fn footprint_is_closed_centered_rectangle() {
        for (width, depth) in [(10_000.0, 5_000.0), (1.0, 1.0), (3_500.0, 12_250.0)] {
            let footprint = build_footprint(width, depth).expect("footprint");
            let points = footprint.points();
            assert_eq!(points.len(), 5);
            assert_eq!(points[0], points[4]);
            assert!(
                ((points[1].x() - points[0].x()).abs() - to_internal_length(width)).abs() < 1e-12
            );
            assert!(
                ((points[2].y() - points[1].y()).abs() - to_internal_length(depth)).abs() < 1e-12
            );

            let sum = points[..4]
                .iter()
                .fold(Point3::ORIGIN.as_vec3(), |acc, point| acc + point.as_vec3());
            assert!(sum.length() < 1e-12);
            assert!(points.iter().all(|point| point.z() == 0.0));
            assert_eq!(points[0].y(), points[1].y());
            assert_eq!(points[1].x(), points[2].x());
            assert_eq!(points[2].y(), points[3].y());
        }
    }

    #[test]
    fn footprint_winds_counter_clockwise_from_south_west() {
        let footprint = build_footprint(10_000.0, 5_000.0).unwrap();
        let dx = to_internal_length(10_000.0) / 2.0;
        let dy = to_internal_length(5_000.0) / 2.0;
        assert_eq!(
            footprint.points(),
            &[
                Point3::new(-dx, -dy, 0.0),
                Point3::new(dx, -dy, 0.0),
                Point3::new(dx, dy, 0.0),
                Point3::new(-dx, dy, 0.0),
                Point3::new(-dx, -dy, 0.0),
            ]
        );
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        for (width, depth) in [(0.0, 5_000.0), (10_000.0, -1.0), (f64::NAN, 1.0)] {
            let err = build_footprint(width, depth).unwrap_err();
            assert!(matches!(err, EngineError::Precondition(_)));
        }
    }

    #[test]
    fn walls_follow_footprint_edges() {
        let (base, top) = levels();
        let footprint = build_footprint(10_000.0, 5_000.0).unwrap();
        let segments = layout_walls(&footprint, &base, &top);
        assert_eq!(segments.len(), 4);
        for (index, segment) in segments.iter().enumerate() {
            assert_eq!(segment.start, footprint.points()[index]);
            assert_eq!(segment.end, footprint.points()[index + 1]);
            assert_eq!(segment.base_level, base.id);
            assert_eq!(segment.top_level, top.id);
        }
        assert_eq!(segments[0].opening_role, OpeningRole::DoorHost);
        assert!(
            segments[1..]
                .iter()
                .all(|segment| segment.opening_role == OpeningRole::WindowHost)
        );
        assert!((segments[0].length() - footprint.width()).abs() < 1e-12);
    }

    #[test]
    fn two_step_creation_sets_both_levels() {
        let mut host = MemoryHost::new();
        let base_id = host.add_level("Level 1", 0.0);
        let top_id = host.add_level("Level 2", 9.0);
        let base = Level::new(base_id, "Level 1", 0.0);
        let top = Level::new(top_id, "Level 2", 9.0);
        let footprint = build_footprint(4_000.0, 2_000.0).unwrap();
        let segment = layout_walls(&footprint, &base, &top).remove(0);

        host.begin_atomic_unit("walls").unwrap();
        let pending = UnconfiguredWall::create(&mut host, segment.clone()).unwrap();
        assert_eq!(host.wall(pending.id()).unwrap().top_level, None);

        let built = pending.assign_top_level(&mut host).unwrap();
        host.commit_atomic_unit().unwrap();

        let stored = host.wall(built.id).unwrap();
        assert_eq!(stored.base_level, base_id);
        assert_eq!(stored.top_level, Some(top_id));
        assert_eq!(built.segment, segment);
        assert_eq!(built.role(), OpeningRole::DoorHost);
    }
}
