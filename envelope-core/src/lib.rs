pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示，坐标单位为内部长度单位（英尺）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        pub const ORIGIN: Point3 = Point3(DVec3::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        /// 两点的算术中点，与参数顺序无关。
        #[inline]
        pub fn midpoint(a: Point3, b: Point3) -> Point3 {
            Point3((a.0 + b.0) * 0.5)
        }

        #[inline]
        pub fn distance(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn approx_eq(self, other: Point3, tolerance: f64) -> bool {
            self.0.abs_diff_eq(other.0, tolerance)
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 三维轴对齐包围盒，由宿主文档按实体（墙体等）返回。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct BoundingBox3 {
        min: Point3,
        max: Point3,
    }

    impl BoundingBox3 {
        /// 以任意两角点构造，自动归一化为 min/max。
        #[inline]
        pub fn new(a: Point3, b: Point3) -> Self {
            Self {
                min: Point3(a.0.min(b.0)),
                max: Point3(a.0.max(b.0)),
            }
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        pub fn include_point(&mut self, point: Point3) {
            self.min = Point3(self.min.0.min(point.0));
            self.max = Point3(self.max.0.max(point.0));
        }

        /// 包围盒形心：min 与 max 的中点。
        #[inline]
        pub fn centroid(&self) -> Point3 {
            Point3::midpoint(self.min, self.max)
        }

        #[inline]
        pub fn extent(&self) -> DVec3 {
            self.max.0 - self.min.0
        }
    }
}

pub mod units {
    /// 每英尺对应的毫米数。内部长度单位为英尺。
    pub const MILLIMETERS_PER_FOOT: f64 = 304.8;

    /// 将外部毫米长度转换为内部长度单位。
    #[inline]
    pub fn to_internal_length(value_mm: f64) -> f64 {
        value_mm / MILLIMETERS_PER_FOOT
    }

    /// 内部长度单位转换回毫米，供报告输出。
    #[inline]
    pub fn from_internal_length(value: f64) -> f64 {
        value * MILLIMETERS_PER_FOOT
    }
}

pub mod model {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point3;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ElementId(u64);

    impl ElementId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    impl fmt::Display for ElementId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LevelId(u64);

    impl LevelId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FamilyTypeId(u64);

    impl FamilyTypeId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 标高：由宿主文档持有，核心只保留其 ID。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Level {
        pub id: LevelId,
        pub name: String,
        /// 内部长度单位。
        pub elevation: f64,
    }

    impl Level {
        #[inline]
        pub fn new(id: LevelId, name: impl Into<String>, elevation: f64) -> Self {
            Self {
                id,
                name: name.into(),
                elevation,
            }
        }
    }

    /// 建筑轮廓：以原点为中心、按逆时针顺序排列的闭合矩形，第 5 点与第 1 点重合。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Footprint {
        points: [Point3; 5],
    }

    impl Footprint {
        /// 由半宽 `dx`、半深 `dy` 构造。调用方负责保证二者为正。
        pub fn from_half_extents(dx: f64, dy: f64) -> Self {
            Self {
                points: [
                    Point3::new(-dx, -dy, 0.0),
                    Point3::new(dx, -dy, 0.0),
                    Point3::new(dx, dy, 0.0),
                    Point3::new(-dx, dy, 0.0),
                    Point3::new(-dx, -dy, 0.0),
                ],
            }
        }

        #[inline]
        pub fn points(&self) -> &[Point3; 5] {
            &self.points
        }

        /// 依次返回相邻点对（即每条边），共 4 条。
        pub fn edges(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
            self.points.windows(2).map(|pair| (pair[0], pair[1]))
        }

        #[inline]
        pub fn width(&self) -> f64 {
            (self.points[1].x() - self.points[0].x()).abs()
        }

        #[inline]
        pub fn depth(&self) -> f64 {
            (self.points[2].y() - self.points[1].y()).abs()
        }
    }

    /// 墙段承担的洞口角色，在布局阶段确定。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OpeningRole {
        DoorHost,
        WindowHost,
    }

    /// 墙段描述：轮廓的一条边，从底部标高延伸到顶部标高。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct WallSegment {
        pub start: Point3,
        pub end: Point3,
        pub base_level: LevelId,
        pub top_level: LevelId,
        pub opening_role: OpeningRole,
    }

    impl WallSegment {
        #[inline]
        pub fn length(&self) -> f64 {
            self.start.distance(self.end)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FamilyCategory {
        Door,
        Window,
    }

    impl FamilyCategory {
        pub fn describe(self) -> &'static str {
            match self {
                FamilyCategory::Door => "door",
                FamilyCategory::Window => "window",
            }
        }
    }

    /// 族类型选择器：类别 + 类型名 + 族名，须在宿主目录中解析到唯一类型。
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FamilyTypeSelector {
        pub category: FamilyCategory,
        pub type_name: String,
        pub family_name: String,
    }

    impl FamilyTypeSelector {
        pub fn new(
            category: FamilyCategory,
            type_name: impl Into<String>,
            family_name: impl Into<String>,
        ) -> Self {
            Self {
                category,
                type_name: type_name.into(),
                family_name: family_name.into(),
            }
        }

        #[inline]
        pub fn door(type_name: impl Into<String>, family_name: impl Into<String>) -> Self {
            Self::new(FamilyCategory::Door, type_name, family_name)
        }

        #[inline]
        pub fn window(type_name: impl Into<String>, family_name: impl Into<String>) -> Self {
            Self::new(FamilyCategory::Window, type_name, family_name)
        }
    }

    impl fmt::Display for FamilyTypeSelector {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{} \"{}\" ({})",
                self.category.describe(),
                self.type_name,
                self.family_name
            )
        }
    }

    /// 洞口放置结果：宿主墙、类型与插入点。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct OpeningPlacement {
        pub host_wall: ElementId,
        pub selector: FamilyTypeSelector,
        pub family_type: FamilyTypeId,
        pub insertion_point: Point3,
        pub level: LevelId,
    }

    impl OpeningPlacement {
        #[inline]
        pub fn category(&self) -> FamilyCategory {
            self.selector.category
        }
    }

    /// 洞口放置失败时的处理策略。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FailurePolicy {
        /// 跳过失败的洞口，已创建的墙与洞口保留。
        #[default]
        Partial,
        /// 在任何修改之前解析全部族类型；原子单元内出错时回滚该单元并中止。
        AllOrNothing,
    }
}

#[cfg(test)]
mod tests {
    use super::geometry::{BoundingBox3, Point3};
    use super::model::{FamilyTypeSelector, Footprint};
    use super::units::{from_internal_length, to_internal_length};

    #[test]
    fn midpoint_ignores_argument_order() {
        let a = Point3::new(-3.0, 1.5, 0.0);
        let b = Point3::new(7.0, -2.5, 4.0);
        assert_eq!(Point3::midpoint(a, b), Point3::midpoint(b, a));
        assert_eq!(Point3::midpoint(a, b), Point3::new(2.0, -0.5, 2.0));
    }

    #[test]
    fn bounding_box_normalizes_corners() {
        let bbox = BoundingBox3::new(Point3::new(5.0, -1.0, 10.0), Point3::new(-5.0, 1.0, 0.0));
        assert_eq!(bbox.min(), Point3::new(-5.0, -1.0, 0.0));
        assert_eq!(bbox.max(), Point3::new(5.0, 1.0, 10.0));
        assert_eq!(bbox.centroid(), Point3::new(0.0, 0.0, 5.0));

        let mut grown = bbox;
        grown.include_point(Point3::new(9.0, 0.0, 0.0));
        assert_eq!(grown.max().x(), 9.0);
        assert_eq!(grown.min().x(), -5.0);
    }

    #[test]
    fn millimeters_convert_to_feet() {
        assert!((to_internal_length(304.8) - 1.0).abs() < 1e-12);
        assert!((to_internal_length(10_000.0) - 32.808_398_950_131_23).abs() < 1e-9);
        assert!((from_internal_length(to_internal_length(5_000.0)) - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn footprint_edges_follow_point_order() {
        let footprint = Footprint::from_half_extents(2.0, 1.0);
        let edges: Vec<_> = footprint.edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0].0, Point3::new(-2.0, -1.0, 0.0));
        assert_eq!(edges[0].1, Point3::new(2.0, -1.0, 0.0));
        assert_eq!(edges[3].1, footprint.points()[0]);
        assert_eq!(footprint.width(), 4.0);
        assert_eq!(footprint.depth(), 2.0);
    }

    #[test]
    fn selector_serializes_with_snake_case_category() {
        let selector = FamilyTypeSelector::window("0915 x 1220mm", "Fixed");
        let json = serde_json::to_value(&selector).expect("serialize selector");
        assert_eq!(json["category"], "window");
        assert_eq!(selector.to_string(), "window \"0915 x 1220mm\" (Fixed)");
    }
}
