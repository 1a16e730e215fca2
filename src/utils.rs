//! Utility functions and helpers for path handling

use std::path::{Component, Path};

/// Normalize a path to use forward slashes
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Whether `path` is relative and never climbs out of the directory it is joined to
pub(crate) fn is_safe_relative(path: &str) -> bool {
    let normalized = normalize_path(path);
    if normalized.is_empty() || normalized.starts_with('/') {
        return false;
    }
    Path::new(&normalized)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
