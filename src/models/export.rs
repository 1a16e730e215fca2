use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Label drawn under the anchor card.
pub const ANCHOR_LABEL: &str = "Original Logo";
/// Label drawn under every neighbor card.
pub const NEIGHBOR_LABEL: &str = "Similarity";

/// Body of `POST /api/export_png`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Anchor image filename.
    pub main_logo: String,
    /// Ranked neighbors to place after the anchor.
    #[serde(default)]
    pub similar_logos: Vec<SimilarLogo>,
}

/// One neighbor entry of an [`ExportRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarLogo {
    /// Image filename, resolved against the renderer's search directories.
    pub filename: String,
    /// Client-side label. Accepted for compatibility; neighbors are always drawn
    /// with [`NEIGHBOR_LABEL`].
    #[serde(default)]
    pub label: Option<String>,
    /// Similarity score to the anchor.
    #[serde(default)]
    pub score: Option<f64>,
}

/// One card of a comparison image.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    /// Image filename.
    pub filename: String,
    /// Text drawn below the card.
    pub label: String,
    /// Score drawn below the label; only the anchor has none.
    pub score: Option<f64>,
}

impl ComparisonEntry {
    /// Entry for the anchor image.
    pub fn anchor(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            label: ANCHOR_LABEL.to_string(),
            score: None,
        }
    }

    /// Entry for a ranked neighbor.
    pub fn neighbor(filename: impl Into<String>, score: f64) -> Self {
        Self {
            filename: filename.into(),
            label: NEIGHBOR_LABEL.to_string(),
            score: Some(score),
        }
    }

    /// Whether this is the anchor card (drawn in the plain label color).
    pub fn is_anchor(&self) -> bool {
        self.label == ANCHOR_LABEL
    }
}

impl ExportRequest {
    /// Ordered card list: the anchor first, then every neighbor in request order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the list would hold more than
    /// `max_logos` cards or a neighbor has no score.
    pub fn into_entries(self, max_logos: usize) -> Result<Vec<ComparisonEntry>> {
        if self.similar_logos.len() >= max_logos {
            return Err(AppError::InvalidInput(format!(
                "{} similar logos requested, at most {} allowed",
                self.similar_logos.len(),
                max_logos.saturating_sub(1)
            )));
        }
        let mut entries = Vec::with_capacity(self.similar_logos.len() + 1);
        entries.push(ComparisonEntry::anchor(self.main_logo));
        for logo in self.similar_logos {
            let score = logo.score.ok_or_else(|| {
                AppError::InvalidInput(format!("missing score for {}", logo.filename))
            })?;
            entries.push(ComparisonEntry::neighbor(logo.filename, score));
        }
        Ok(entries)
    }
}
