use std::collections::{HashMap, HashSet};

use envelope_core::geometry::{BoundingBox3, Point3};
use envelope_core::model::{
    ElementId, FamilyCategory, FamilyTypeId, FamilyTypeSelector, Level, LevelId,
};
use glam::DVec3;
use serde::Serialize;
use tracing::debug;

use crate::host::{HostDocument, HostError};

/// 未设置顶部标高时墙体的默认高度（内部长度单位）。
pub const DEFAULT_UNCONNECTED_HEIGHT: f64 = 10.0;

const DEFAULT_WALL_THICKNESS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryWall {
    pub id: ElementId,
    pub start: Point3,
    pub end: Point3,
    pub base_level: LevelId,
    pub top_level: Option<LevelId>,
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInstance {
    pub id: ElementId,
    pub family_type: FamilyTypeId,
    pub category: FamilyCategory,
    pub host_wall: ElementId,
    pub level: LevelId,
    pub point: Point3,
}

#[derive(Debug, Clone, PartialEq)]
enum MemoryElement {
    Wall(MemoryWall),
    Instance(MemoryInstance),
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    id: FamilyTypeId,
    selector: FamilyTypeSelector,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    elements: Vec<(ElementId, MemoryElement)>,
    active_types: HashSet<FamilyTypeId>,
}

#[derive(Debug)]
struct OpenUnit {
    label: String,
    snapshot: Snapshot,
}

/// 内存宿主文档，供命令行演示与测试使用。
///
/// 原子单元以快照实现：`begin` 时保存元素表，回滚或提交失败时恢复。
/// ID 计数器不随回滚还原，已分配的 ID 不会被复用。
#[derive(Debug)]
pub struct MemoryHost {
    levels: Vec<Level>,
    catalog: Vec<CatalogEntry>,
    state: Snapshot,
    open_unit: Option<OpenUnit>,
    committed_units: Vec<String>,
    reject_commit_of: HashSet<String>,
    activation_calls: HashMap<FamilyTypeId, usize>,
    wall_thickness: f64,
    extend_joined_ends: bool,
    next_id: u64,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            catalog: Vec::new(),
            state: Snapshot::default(),
            open_unit: None,
            committed_units: Vec::new(),
            reject_commit_of: HashSet::new(),
            activation_calls: HashMap::new(),
            wall_thickness: DEFAULT_WALL_THICKNESS,
            extend_joined_ends: true,
            next_id: 1,
        }
    }

    /// 设置新建墙体的厚度（内部长度单位）。
    pub fn with_wall_thickness(mut self, thickness: f64) -> Self {
        self.wall_thickness = thickness.abs();
        self
    }

    /// 控制墙体包围盒是否在两端各延伸半个墙厚，模拟转角处的端部连接。
    pub fn with_joined_ends(mut self, enabled: bool) -> Self {
        self.extend_joined_ends = enabled;
        self
    }

    pub fn add_level(&mut self, name: impl Into<String>, elevation: f64) -> LevelId {
        let id = LevelId::new(self.allocate());
        self.levels.push(Level::new(id, name, elevation));
        id
    }

    pub fn add_family_type(&mut self, selector: FamilyTypeSelector) -> FamilyTypeId {
        let id = FamilyTypeId::new(self.allocate());
        self.catalog.push(CatalogEntry { id, selector });
        id
    }

    /// 使带有指定标签的原子单元在提交时失败，用于模拟宿主拒绝提交。
    pub fn reject_commit_of(&mut self, label: impl Into<String>) {
        self.reject_commit_of.insert(label.into());
    }

    pub fn walls(&self) -> impl Iterator<Item = &MemoryWall> {
        self.state.elements.iter().filter_map(|(_, element)| match element {
            MemoryElement::Wall(wall) => Some(wall),
            MemoryElement::Instance(_) => None,
        })
    }

    pub fn instances(&self) -> impl Iterator<Item = &MemoryInstance> {
        self.state.elements.iter().filter_map(|(_, element)| match element {
            MemoryElement::Instance(instance) => Some(instance),
            MemoryElement::Wall(_) => None,
        })
    }

    pub fn instances_on(&self, wall: ElementId) -> impl Iterator<Item = &MemoryInstance> {
        self.instances()
            .filter(move |instance| instance.host_wall == wall)
    }

    pub fn wall(&self, id: ElementId) -> Option<&MemoryWall> {
        self.walls().find(|wall| wall.id == id)
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.state.elements.len()
    }

    /// 已成功提交的原子单元标签，按提交顺序排列。
    #[inline]
    pub fn committed_units(&self) -> &[String] {
        &self.committed_units
    }

    /// 当前打开的原子单元标签。
    pub fn open_unit(&self) -> Option<&str> {
        self.open_unit.as_ref().map(|unit| unit.label.as_str())
    }

    /// 统计 `activate_family_type` 被调用的次数。
    pub fn activation_calls(&self, family_type: FamilyTypeId) -> usize {
        self.activation_calls.get(&family_type).copied().unwrap_or(0)
    }

    #[inline]
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn require_open_unit(&self) -> Result<(), HostError> {
        if self.open_unit.is_some() {
            Ok(())
        } else {
            Err(HostError::NoActiveUnit)
        }
    }

    fn level(&self, id: LevelId) -> Result<&Level, HostError> {
        self.levels
            .iter()
            .find(|level| level.id == id)
            .ok_or(HostError::LevelNotFound(id.get()))
    }

    fn catalog_entry(&self, id: FamilyTypeId) -> Result<&CatalogEntry, HostError> {
        self.catalog
            .iter()
            .find(|entry| entry.id == id)
            .ok_or(HostError::FamilyTypeNotFound(id.get()))
    }

    fn element(&self, id: ElementId) -> Result<&MemoryElement, HostError> {
        self.state
            .elements
            .iter()
            .find_map(|(element_id, element)| (*element_id == id).then_some(element))
            .ok_or(HostError::ElementNotFound(id.get()))
    }

    fn wall_mut(&mut self, id: ElementId) -> Result<&mut MemoryWall, HostError> {
        let element = self
            .state
            .elements
            .iter_mut()
            .find_map(|(element_id, element)| (*element_id == id).then_some(element))
            .ok_or(HostError::ElementNotFound(id.get()))?;
        match element {
            MemoryElement::Wall(wall) => Ok(wall),
            MemoryElement::Instance(_) => Err(HostError::NotAWall(id.get())),
        }
    }

    fn wall_bounds(&self, wall: &MemoryWall) -> Result<BoundingBox3, HostError> {
        let base = self.level(wall.base_level)?.elevation;
        let top = match wall.top_level {
            Some(level) => self.level(level)?.elevation,
            None => base + DEFAULT_UNCONNECTED_HEIGHT,
        };

        let start = wall.start.as_vec3();
        let end = wall.end.as_vec3();
        let half = wall.thickness * 0.5;
        let along = DVec3::new(end.x - start.x, end.y - start.y, 0.0).normalize_or_zero();
        let across = DVec3::new(-along.y, along.x, 0.0) * half;
        let extension = if self.extend_joined_ends {
            along * half
        } else {
            DVec3::ZERO
        };

        let mut bounds = BoundingBox3::new(
            Point3::new(start.x, start.y, base),
            Point3::new(end.x, end.y, top),
        );
        for corner in [start - extension, end + extension] {
            for offset in [across, -across] {
                let planar = corner + offset;
                bounds.include_point(Point3::new(planar.x, planar.y, base));
                bounds.include_point(Point3::new(planar.x, planar.y, top));
            }
        }
        Ok(bounds)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument for MemoryHost {
    fn list_levels(&self) -> Vec<Level> {
        self.levels.clone()
    }

    fn create_wall(
        &mut self,
        start: Point3,
        end: Point3,
        base_level: LevelId,
    ) -> Result<ElementId, HostError> {
        self.require_open_unit()?;
        self.level(base_level)?;
        let id = ElementId::new(self.allocate());
        let wall = MemoryWall {
            id,
            start,
            end,
            base_level,
            top_level: None,
            thickness: self.wall_thickness,
        };
        self.state.elements.push((id, MemoryElement::Wall(wall)));
        debug!(wall = id.get(), "已创建墙体");
        Ok(id)
    }

    fn set_wall_top_level(
        &mut self,
        wall: ElementId,
        top_level: LevelId,
    ) -> Result<(), HostError> {
        self.require_open_unit()?;
        self.level(top_level)?;
        self.wall_mut(wall)?.top_level = Some(top_level);
        Ok(())
    }

    fn find_family_type(&self, selector: &FamilyTypeSelector) -> Option<FamilyTypeId> {
        self.catalog
            .iter()
            .find(|entry| entry.selector == *selector)
            .map(|entry| entry.id)
    }

    fn is_family_type_active(&self, family_type: FamilyTypeId) -> bool {
        self.state.active_types.contains(&family_type)
    }

    fn activate_family_type(&mut self, family_type: FamilyTypeId) -> Result<(), HostError> {
        self.require_open_unit()?;
        self.catalog_entry(family_type)?;
        *self.activation_calls.entry(family_type).or_insert(0) += 1;
        self.state.active_types.insert(family_type);
        Ok(())
    }

    fn create_family_instance(
        &mut self,
        point: Point3,
        family_type: FamilyTypeId,
        host_wall: ElementId,
        level: LevelId,
    ) -> Result<ElementId, HostError> {
        self.require_open_unit()?;
        let category = self.catalog_entry(family_type)?.selector.category;
        if !self.state.active_types.contains(&family_type) {
            return Err(HostError::InactiveFamilyType(family_type.get()));
        }
        if !matches!(self.element(host_wall)?, MemoryElement::Wall(_)) {
            return Err(HostError::NotAWall(host_wall.get()));
        }
        self.level(level)?;

        let id = ElementId::new(self.allocate());
        let instance = MemoryInstance {
            id,
            family_type,
            category,
            host_wall,
            level,
            point,
        };
        self.state
            .elements
            .push((id, MemoryElement::Instance(instance)));
        debug!(
            instance = id.get(),
            host_wall = host_wall.get(),
            category = category.describe(),
            "已创建族实例"
        );
        Ok(id)
    }

    fn wall_location_endpoints(&self, wall: ElementId) -> Result<(Point3, Point3), HostError> {
        match self.element(wall)? {
            MemoryElement::Wall(wall) => Ok((wall.start, wall.end)),
            MemoryElement::Instance(_) => Err(HostError::NotAWall(wall.get())),
        }
    }

    fn bounding_box(&self, element: ElementId) -> Result<BoundingBox3, HostError> {
        match self.element(element)? {
            MemoryElement::Wall(wall) => self.wall_bounds(wall),
            MemoryElement::Instance(instance) => {
                Ok(BoundingBox3::new(instance.point, instance.point))
            }
        }
    }

    fn begin_atomic_unit(&mut self, label: &str) -> Result<(), HostError> {
        if let Some(open) = &self.open_unit {
            return Err(HostError::UnitAlreadyOpen {
                open: open.label.clone(),
            });
        }
        self.open_unit = Some(OpenUnit {
            label: label.to_string(),
            snapshot: self.state.clone(),
        });
        Ok(())
    }

    fn commit_atomic_unit(&mut self) -> Result<(), HostError> {
        let unit = self.open_unit.take().ok_or(HostError::NoActiveUnit)?;
        if self.reject_commit_of.contains(&unit.label) {
            self.state = unit.snapshot;
            return Err(HostError::CommitRejected(unit.label));
        }
        self.committed_units.push(unit.label);
        Ok(())
    }

    fn rollback_atomic_unit(&mut self) -> Result<(), HostError> {
        let unit = self.open_unit.take().ok_or(HostError::NoActiveUnit)?;
        self.state = unit.snapshot;
        Ok(())
    }
}
