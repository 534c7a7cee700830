use envelope_core::geometry::{BoundingBox3, Point3};
use envelope_core::model::{ElementId, FamilyTypeId, FamilyTypeSelector, Level, LevelId};
use thiserror::Error;

/// 宿主文档返回的错误，核心不解释其含义，只负责向上传递。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("no atomic unit is open")]
    NoActiveUnit,
    #[error("atomic unit \"{open}\" is still open")]
    UnitAlreadyOpen { open: String },
    #[error("element with id {0} not found")]
    ElementNotFound(u64),
    #[error("element with id {0} is not a wall")]
    NotAWall(u64),
    #[error("level with id {0} not found")]
    LevelNotFound(u64),
    #[error("family type with id {0} not found")]
    FamilyTypeNotFound(u64),
    #[error("family type with id {0} is not active")]
    InactiveFamilyType(u64),
    #[error("commit rejected: {0}")]
    CommitRejected(String),
}

/// 宿主文档服务。核心只通过该 trait 创建、查询实体并提交修改。
///
/// 所有创建类调用都必须位于 `begin_atomic_unit` 与 `commit_atomic_unit`
/// 之间；同一时刻最多只有一个原子单元处于打开状态。
pub trait HostDocument {
    /// 按枚举顺序返回文档中的全部标高。
    fn list_levels(&self) -> Vec<Level>;

    /// 以底部标高创建墙体，顶部标高需随后通过 `set_wall_top_level` 设置。
    fn create_wall(
        &mut self,
        start: Point3,
        end: Point3,
        base_level: LevelId,
    ) -> Result<ElementId, HostError>;

    fn set_wall_top_level(&mut self, wall: ElementId, top_level: LevelId)
    -> Result<(), HostError>;

    /// 按类别、类型名与族名查找，多个匹配时返回枚举顺序中的第一个。
    fn find_family_type(&self, selector: &FamilyTypeSelector) -> Option<FamilyTypeId>;

    fn is_family_type_active(&self, family_type: FamilyTypeId) -> bool;

    /// 激活族类型，重复调用无副作用。
    fn activate_family_type(&mut self, family_type: FamilyTypeId) -> Result<(), HostError>;

    fn create_family_instance(
        &mut self,
        point: Point3,
        family_type: FamilyTypeId,
        host_wall: ElementId,
        level: LevelId,
    ) -> Result<ElementId, HostError>;

    /// 墙体定位线的两个端点，可能因端部连接与原始轮廓点存在微小差异。
    fn wall_location_endpoints(&self, wall: ElementId) -> Result<(Point3, Point3), HostError>;

    fn bounding_box(&self, element: ElementId) -> Result<BoundingBox3, HostError>;

    fn begin_atomic_unit(&mut self, label: &str) -> Result<(), HostError>;

    fn commit_atomic_unit(&mut self) -> Result<(), HostError>;

    /// 放弃当前原子单元内的全部修改。
    fn rollback_atomic_unit(&mut self) -> Result<(), HostError>;
}
