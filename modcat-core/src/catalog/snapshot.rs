//! Catalog snapshot: module name → record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ModuleRecord;

/// A complete catalog as assembled by one load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    modules: BTreeMap<String, ModuleRecord>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record keyed by its name, replacing any previous entry
    pub fn insert(&mut self, module: ModuleRecord) -> Option<ModuleRecord> {
        self.modules.insert(module.name.clone(), module)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleRecord> {
        self.modules.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names, sorted
    pub fn names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// Keep only the records whose name satisfies `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.modules.retain(|name, _| keep(name));
    }
}

impl FromIterator<ModuleRecord> for CatalogSnapshot {
    fn from_iter<I: IntoIterator<Item = ModuleRecord>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for module in iter {
            snapshot.insert(module);
        }
        snapshot
    }
}

impl IntoIterator for CatalogSnapshot {
    type Item = ModuleRecord;
    type IntoIter = std::collections::btree_map::IntoValues<String, ModuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_insert_wins() {
        let mut snapshot = CatalogSnapshot::new();
        let mut first = ModuleRecord::named("blog");
        first.description = "first".to_string();
        let mut second = ModuleRecord::named("blog");
        second.description = "second".to_string();

        assert!(snapshot.insert(first).is_none());
        assert!(snapshot.insert(second).is_some());

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("blog").unwrap().description, "second");
    }

    #[test]
    fn test_serializes_as_name_map() {
        let snapshot: CatalogSnapshot = ["b", "a"].into_iter().map(ModuleRecord::named).collect();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("a").is_some());
        assert!(json.get("b").is_some());

        let restored: CatalogSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(restored.names(), vec!["a", "b"]);
    }
}
