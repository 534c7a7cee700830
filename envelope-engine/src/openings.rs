use envelope_core::geometry::{BoundingBox3, Point3};
use envelope_core::model::{
    FamilyCategory, FamilyTypeId, FamilyTypeSelector, LevelId, OpeningPlacement, OpeningRole,
};
use tracing::debug;

use crate::errors::EngineError;
use crate::host::HostDocument;
use crate::layout::BuiltWall;

/// 门插入点：墙体定位线两端点的中点。
#[inline]
pub fn door_insertion_point(p1: Point3, p2: Point3) -> Point3 {
    Point3::midpoint(p1, p2)
}

/// 窗插入点：定位线中点与墙体包围盒形心的中点。
///
/// 包围盒形心会受墙厚、端部延伸与墙高影响，因此结果一般不等于定位线中点。
#[inline]
pub fn window_insertion_point(p1: Point3, p2: Point3, bounds: &BoundingBox3) -> Point3 {
    Point3::midpoint(Point3::midpoint(p1, p2), bounds.centroid())
}

/// 在宿主目录中查找族类型，找不到即视为解析失败。
pub fn resolve_family_type<H>(
    host: &H,
    selector: &FamilyTypeSelector,
) -> Result<FamilyTypeId, EngineError>
where
    H: HostDocument + ?Sized,
{
    host.find_family_type(selector)
        .ok_or_else(|| EngineError::FamilyTypeNotFound {
            selector: selector.clone(),
        })
}

/// 族类型未激活时激活一次。
pub fn ensure_active<H>(host: &mut H, family_type: FamilyTypeId) -> Result<(), EngineError>
where
    H: HostDocument + ?Sized,
{
    if !host.is_family_type_active(family_type) {
        host.activate_family_type(family_type)?;
        debug!(family_type = family_type.get(), "已激活族类型");
    }
    Ok(())
}

/// 计算门在承载墙上的放置结果。只接受 `DoorHost` 角色的墙。
pub fn place_door<H>(
    host: &mut H,
    wall: &BuiltWall,
    level: LevelId,
    selector: &FamilyTypeSelector,
) -> Result<OpeningPlacement, EngineError>
where
    H: HostDocument + ?Sized,
{
    check_request(wall, selector, FamilyCategory::Door, OpeningRole::DoorHost)?;
    let family_type = resolve_family_type(host, selector)?;
    ensure_active(host, family_type)?;

    let (p1, p2) = host.wall_location_endpoints(wall.id)?;
    Ok(OpeningPlacement {
        host_wall: wall.id,
        selector: selector.clone(),
        family_type,
        insertion_point: door_insertion_point(p1, p2),
        level,
    })
}

/// 计算窗在承载墙上的放置结果。承载门的墙会被拒绝。
pub fn place_window<H>(
    host: &mut H,
    wall: &BuiltWall,
    level: LevelId,
    selector: &FamilyTypeSelector,
) -> Result<OpeningPlacement, EngineError>
where
    H: HostDocument + ?Sized,
{
    check_request(wall, selector, FamilyCategory::Window, OpeningRole::WindowHost)?;
    let family_type = resolve_family_type(host, selector)?;
    ensure_active(host, family_type)?;

    let (p1, p2) = host.wall_location_endpoints(wall.id)?;
    let bounds = host.bounding_box(wall.id)?;
    Ok(OpeningPlacement {
        host_wall: wall.id,
        selector: selector.clone(),
        family_type,
        insertion_point: window_insertion_point(p1, p2, &bounds),
        level,
    })
}

fn check_request(
    wall: &BuiltWall,
    selector: &FamilyTypeSelector,
    category: FamilyCategory,
    role: OpeningRole,
) -> Result<(), EngineError> {
    if selector.category != category {
        return Err(EngineError::Precondition(format!(
            "selector {selector} cannot be placed as a {}",
            category.describe()
        )));
    }
    if wall.role() != role {
        return Err(EngineError::Precondition(format!(
            "wall {} is a {:?}, expected {:?}",
            wall.id,
            wall.role(),
            role
        )));
    }
    Ok(())
}
