use std::collections::HashMap;
use std::collections::hash_map::Entry;

use envelope_core::model::Level;
use tracing::warn;

use crate::errors::EngineError;

/// 在标高集合中按名称查找，大小写敏感，重名时取枚举顺序中的第一个。
pub fn resolve_level<'a>(levels: &'a [Level], name: &str) -> Result<&'a Level, EngineError> {
    if levels.is_empty() {
        return Err(EngineError::Precondition(
            "document contains no levels".to_string(),
        ));
    }
    levels
        .iter()
        .find(|level| level.name == name)
        .ok_or_else(|| EngineError::LevelNotFound {
            name: name.to_string(),
        })
}

/// 以名称为键的标高查找表。
///
/// 重名标高不去重也不报错：表中只保留第一个，其余名称记录在
/// `duplicates` 中供诊断。
#[derive(Debug)]
pub struct LevelTable<'a> {
    by_name: HashMap<&'a str, &'a Level>,
    duplicates: Vec<&'a str>,
}

impl<'a> LevelTable<'a> {
    pub fn new(levels: &'a [Level]) -> Result<Self, EngineError> {
        if levels.is_empty() {
            return Err(EngineError::Precondition(
                "document contains no levels".to_string(),
            ));
        }
        let mut by_name = HashMap::with_capacity(levels.len());
        let mut duplicates = Vec::new();
        for level in levels {
            match by_name.entry(level.name.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(level);
                }
                Entry::Occupied(_) => {
                    warn!(name = %level.name, id = level.id.get(), "发现重名标高，按首个匹配处理");
                    duplicates.push(level.name.as_str());
                }
            }
        }
        Ok(Self {
            by_name,
            duplicates,
        })
    }

    pub fn resolve(&self, name: &str) -> Result<&'a Level, EngineError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::LevelNotFound {
                name: name.to_string(),
            })
    }

    #[inline]
    pub fn duplicates(&self) -> &[&'a str] {
        &self.duplicates
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use envelope_core::model::LevelId;

    use super::*;

    fn sample_levels() -> Vec<Level> {
        vec![
            Level::new(LevelId::new(1), "Level 1", 0.0),
            Level::new(LevelId::new(2), "Level 2", 9.84),
            Level::new(LevelId::new(3), "Level 1", 20.0),
        ]
    }

    #[test]
    fn resolution_is_exact_and_first_match_wins() {
        let levels = sample_levels();
        let level = resolve_level(&levels, "Level 1").expect("level 1");
        assert_eq!(level.id, LevelId::new(1));

        let err = resolve_level(&levels, "level 1").unwrap_err();
        assert!(matches!(err, EngineError::LevelNotFound { ref name } if name == "level 1"));
        assert!(err.is_resolution_failure());
    }

    #[test]
    fn resolution_is_idempotent() {
        let levels = sample_levels();
        let table = LevelTable::new(&levels).unwrap();
        let first = table.resolve("Level 2").unwrap().id;
        let second = table.resolve("Level 2").unwrap().id;
        assert_eq!(first, second);
        assert_eq!(
            resolve_level(&levels, "Level 2").unwrap().id,
            resolve_level(&levels, "Level 2").unwrap().id
        );
    }

    #[test]
    fn table_keeps_first_and_reports_duplicates() {
        let levels = sample_levels();
        let table = LevelTable::new(&levels).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("Level 1").unwrap().id, LevelId::new(1));
        assert_eq!(table.duplicates(), ["Level 1"]);
    }

    #[test]
    fn empty_level_set_is_a_precondition_violation() {
        assert!(matches!(
            resolve_level(&[], "Level 1"),
            Err(EngineError::Precondition(_))
        ));
        assert!(matches!(
            LevelTable::new(&[]),
            Err(EngineError::Precondition(_))
        ));
    }
}
