//! Domain and wire types shared by the store, the renderer and the API

/// Export request and comparison entry types.
pub mod export;
/// Score tables, selectors and neighbor results.
pub mod scores;
