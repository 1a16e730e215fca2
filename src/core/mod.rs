//! Core functionality: score-table lookup and comparison rendering

/// Score-table caches injected into the store.
pub mod cache;
/// Identifier canonicalization.
pub mod canonical;
/// Font loading and text drawing with fallbacks.
pub mod fonts;
/// Comparison image composition.
pub mod render;
/// Score-table loading and neighbor queries.
pub mod store;
