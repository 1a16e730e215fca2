//! Score-table cache collaborators

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::scores::{Scheme, ScoreTable, SetLabel};

/// Cache key: one table per (scheme, set).
pub type TableKey = (Scheme, SetLabel);

/// Holds loaded score tables between requests.
///
/// Tables are immutable once inserted. Two requests racing on the same
/// uncached key may both load it; the later insert simply replaces an
/// identical table.
pub trait TableCache: Send + Sync + std::fmt::Debug {
    /// Cached table for `key`, if any.
    fn get(&self, key: &TableKey) -> Option<Arc<ScoreTable>>;

    /// Stores a freshly loaded table.
    fn insert(&self, key: TableKey, table: Arc<ScoreTable>);
}

/// Process-wide in-memory cache. Entries are never invalidated.
#[derive(Debug, Default)]
pub struct InMemoryTableCache {
    tables: RwLock<HashMap<TableKey, Arc<ScoreTable>>>,
}

impl InMemoryTableCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

impl TableCache for InMemoryTableCache {
    fn get(&self, key: &TableKey) -> Option<Arc<ScoreTable>> {
        self.tables.read().get(key).cloned()
    }

    fn insert(&self, key: TableKey, table: Arc<ScoreTable>) {
        self.tables.write().insert(key, table);
    }
}

/// Cache that never retains anything; every lookup reloads from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl TableCache for NoCache {
    fn get(&self, _key: &TableKey) -> Option<Arc<ScoreTable>> {
        None
    }

    fn insert(&self, _key: TableKey, _table: Arc<ScoreTable>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_cache_roundtrip() {
        let cache = InMemoryTableCache::new();
        let key = (Scheme::Ssim, SetLabel::default());
        assert!(cache.get(&key).is_none());

        let table = Arc::new(ScoreTable::from_pairs([("a.png", "b.png", 0.5)]));
        cache.insert(key.clone(), table.clone());
        assert!(Arc::ptr_eq(&cache.get(&key).unwrap(), &table));
        assert_eq!(cache.len(), 1);

        assert!(cache.get(&(Scheme::Block4, SetLabel::default())).is_none());
    }

    #[test]
    fn test_no_cache_forgets() {
        let key = (Scheme::Block4, SetLabel::default());
        NoCache.insert(key.clone(), Arc::new(ScoreTable::default()));
        assert!(NoCache.get(&key).is_none());
    }
}
