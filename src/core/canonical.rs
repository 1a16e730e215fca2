//! Path canonicalization for image identifiers

use std::borrow::Cow;

use crate::models::scores::SetLabel;
use crate::utils::normalize_path;

/// Rewrites `raw` into the canonical `<set prefix><filename>` form.
///
/// Identifiers already under the set's prefix are returned as they are. Anything
/// else keeps only its filename component, so a path recorded under a different
/// set's directory is re-homed under `set`.
pub fn canonicalize<'a>(raw: &'a str, set: &SetLabel) -> Cow<'a, str> {
    let prefix = set.prefix();
    if raw.starts_with(&prefix) {
        return Cow::Borrowed(raw);
    }
    let normalized = normalize_path(raw);
    let filename = normalized.rsplit('/').next().unwrap_or_default();
    Cow::Owned(format!("{}{}", prefix, filename))
}
