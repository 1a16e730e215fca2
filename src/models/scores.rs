use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Separator joining the two identifiers of a persisted pair key.
pub const PAIR_SEPARATOR: char = '|';

/// Root directory shared by every set's canonical prefix.
pub const IMAGE_COLLECTION_DIR: &str = "pngs_ALL_inkscape_512";

/// Similarity metric a score table was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scheme {
    /// Cosine similarity of block4_conv3 feature maps.
    #[default]
    Block4,
    /// Structural similarity index.
    Ssim,
}

impl Scheme {
    /// Name used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block4 => "block4",
            Self::Ssim => "ssim",
        }
    }

    /// Location of the persisted table for `set` below `data_dir`.
    pub fn resource_path(&self, data_dir: &Path, set: &SetLabel) -> PathBuf {
        match self {
            Self::Block4 => data_dir.join(format!(
                "block4_similarities_pngs_{}_inkscape_512.json",
                set.as_str()
            )),
            Self::Ssim => data_dir
                .join("ssim_data")
                .join(format!("ssim_scores_{}.json", set.as_str())),
        }
    }
}

// Every method name other than "block4" selects SSIM.
impl From<&str> for Scheme {
    fn from(method: &str) -> Self {
        if method == "block4" {
            Self::Block4
        } else {
            Self::Ssim
        }
    }
}

impl From<String> for Scheme {
    fn from(method: String) -> Self {
        Self::from(method.as_str())
    }
}

impl From<Scheme> for String {
    fn from(scheme: Scheme) -> Self {
        scheme.as_str().to_string()
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named partition of the logo collection, e.g. `A` or `B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetLabel(String);

impl SetLabel {
    /// Validates a set label. Only ASCII alphanumerics, `_` and `-` are accepted
    /// since the label is spliced into file names and directory prefixes.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(AppError::InvalidInput("set label must not be empty".to_string()));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::InvalidInput(format!("invalid set label: {}", label)));
        }
        Ok(Self(label))
    }

    /// The raw label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical directory prefix for images of this set, with trailing slash.
    pub fn prefix(&self) -> String {
        format!("{}/pngs_{}_inkscape_512/", IMAGE_COLLECTION_DIR, self.0)
    }
}

impl Default for SetLabel {
    fn default() -> Self {
        Self("A".to_string())
    }
}

impl fmt::Display for SetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order-independent key of an image pair: the smaller identifier is always `first`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    /// Builds the key for the unordered pair `{a, b}`.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Parses a persisted `"id1|id2"` key.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(PAIR_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => Ok(Self::new(a, b)),
            _ => Err(AppError::Format(format!("malformed pair key: {:?}", raw))),
        }
    }

    /// The lexicographically smaller identifier.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// The lexicographically larger identifier.
    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Shapes a score resource may take on disk.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreFile {
    Wrapped {
        scores: HashMap<String, f64>,
        #[serde(default)]
        metadata: serde_json::Value,
    },
    Flat(HashMap<String, f64>),
}

/// Immutable table of pairwise similarity scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    scores: BTreeMap<PairKey, f64>,
    metadata: serde_json::Value,
}

impl ScoreTable {
    /// Builds a table from `(id1, id2, score)` triples. A repeated unordered pair keeps
    /// its first score.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: Into<String>,
    {
        let mut scores = BTreeMap::new();
        for (a, b, score) in pairs {
            let key = PairKey::new(a, b);
            if scores.contains_key(&key) {
                log::warn!("duplicate pair {}|{} ignored", key.first(), key.second());
                continue;
            }
            scores.insert(key, score);
        }
        Self {
            scores,
            metadata: serde_json::Value::Null,
        }
    }

    /// Parses a persisted resource, either `{"scores": {...}, "metadata": {...}}`
    /// or a flat `{"id1|id2": score}` mapping.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ScoreFile = serde_json::from_str(json).map_err(|e| {
            AppError::Format(format!("expected a pair->score mapping: {}", e))
        })?;
        let (raw, metadata) = match file {
            ScoreFile::Wrapped { scores, metadata } => (scores, metadata),
            ScoreFile::Flat(scores) => (scores, serde_json::Value::Null),
        };

        // HashMap order is arbitrary; sort so "first key wins" is reproducible.
        let mut raw: Vec<(String, f64)> = raw.into_iter().collect();
        raw.sort_by(|a, b| a.0.cmp(&b.0));

        let mut pairs = Vec::with_capacity(raw.len());
        for (key, score) in raw {
            let key = PairKey::parse(&key)?;
            pairs.push((key.first, key.second, score));
        }

        let mut table = Self::from_pairs(pairs);
        table.metadata = metadata;
        Ok(table)
    }

    /// Score of the unordered pair `{a, b}`, if present.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.scores.get(&PairKey::new(a, b)).copied()
    }

    /// Iterates pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, f64)> + '_ {
        self.scores.iter().map(|(k, v)| (k, *v))
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the table has no pairs.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Metadata stored alongside wrapped resources (`Null` for flat ones).
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}

/// One ranked neighbor; serialized as `[identifier, score]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct NeighborResult {
    /// Canonical identifier of the neighbor.
    pub identifier: String,
    /// Similarity score shared with the anchor.
    pub score: f64,
}

impl From<(String, f64)> for NeighborResult {
    fn from((identifier, score): (String, f64)) -> Self {
        Self { identifier, score }
    }
}

impl From<NeighborResult> for (String, f64) {
    fn from(result: NeighborResult) -> Self {
        (result.identifier, result.score)
    }
}
