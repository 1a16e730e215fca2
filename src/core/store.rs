//! Similarity store: loads score tables and answers neighbor queries

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::cache::{InMemoryTableCache, TableCache};
use crate::core::canonical::canonicalize;
use crate::error::{AppError, Result};
use crate::models::scores::{NeighborResult, Scheme, ScoreTable, SetLabel};

/// Resolves (scheme, set) selectors to score tables below a storage root.
#[derive(Debug, Clone)]
pub struct SimilarityStore {
    data_dir: PathBuf,
    cache: Arc<dyn TableCache>,
}

impl SimilarityStore {
    /// Store reading from `data_dir` with a fresh in-memory cache.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_cache(data_dir, Arc::new(InMemoryTableCache::new()))
    }

    /// Store reading from `data_dir` with a caller-supplied cache.
    pub fn with_cache(data_dir: impl Into<PathBuf>, cache: Arc<dyn TableCache>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache,
        }
    }

    /// Loads (or reuses) the table for `scheme` and `set`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] if the backing file does not exist,
    /// [`AppError::Format`] if it is not a pair->score mapping.
    pub fn load_score_table(&self, scheme: Scheme, set: &SetLabel) -> Result<Arc<ScoreTable>> {
        let _span = tracing::debug_span!("load_score_table", %scheme, %set).entered();
        let key = (scheme, set.clone());
        if let Some(table) = self.cache.get(&key) {
            return Ok(table);
        }

        let path = scheme.resource_path(&self.data_dir, set);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "no {} scores for set {} at {}",
                    scheme,
                    set,
                    path.display()
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let table = ScoreTable::from_json(&json).map_err(|e| match e {
            AppError::Format(msg) => AppError::Format(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        log::info!(
            "Loaded {} {} pairs for set {} from {}",
            table.len(),
            scheme,
            set,
            path.display()
        );

        let table = Arc::new(table);
        self.cache.insert(key, table.clone());
        Ok(table)
    }

    /// Distinct canonical identifiers for `scheme`/`set`, sorted.
    pub fn logos(&self, scheme: Scheme, set: &SetLabel) -> Result<Vec<String>> {
        let table = self.load_score_table(scheme, set)?;
        Ok(list_distinct_images(&table, set).into_iter().collect())
    }

    /// Ranked neighbors of `anchor` for `scheme`/`set`.
    pub fn similar(&self, scheme: Scheme, set: &SetLabel, anchor: &str) -> Result<Vec<NeighborResult>> {
        let table = self.load_score_table(scheme, set)?;
        let neighbors = find_neighbors(&table, set, anchor);
        log::debug!("Found {} {} neighbors for {}", neighbors.len(), scheme, anchor);
        Ok(neighbors)
    }
}

/// Every identifier appearing in `table`, canonicalized for `set` and deduplicated.
pub fn list_distinct_images(table: &ScoreTable, set: &SetLabel) -> BTreeSet<String> {
    table
        .iter()
        .flat_map(|(pair, _)| [pair.first(), pair.second()])
        .map(|raw| canonicalize(raw, set).into_owned())
        .collect()
}

/// Pairs touching `anchor`, as (other member, score), sorted by descending score.
///
/// Both members and the anchor are compared in canonical form. Pairs whose
/// members both canonicalize to the anchor are skipped. Equal scores keep
/// table order.
pub fn find_neighbors(table: &ScoreTable, set: &SetLabel, anchor: &str) -> Vec<NeighborResult> {
    let anchor = canonicalize(anchor, set);
    let mut neighbors: Vec<NeighborResult> = table
        .iter()
        .filter_map(|(pair, score)| {
            let first = canonicalize(pair.first(), set);
            let second = canonicalize(pair.second(), set);
            let other = match (first == anchor, second == anchor) {
                (true, false) => second,
                (false, true) => first,
                _ => return None,
            };
            Some(NeighborResult {
                identifier: other.into_owned(),
                score,
            })
        })
        .collect();

    neighbors.sort_by(|a, b| b.score.total_cmp(&a.score));
    neighbors
}
