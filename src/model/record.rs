//! Insight records and duplicate groupings.

use serde::{Deserialize, Serialize};

/// One canonical unit of normalized insight content.
///
/// A record is valid when its trimmed text is longer than the configured
/// minimum (10 characters by default); shorter candidates are dropped
/// silently during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    /// The guidance text, trimmed.
    pub text: String,
    /// Canonical behavioral category.
    pub category: String,
    /// The owning number/planet/sign.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic_key: String,
    /// Domain confidence/strength score.
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<String>,
    /// Provenance: the source file this record came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Position within the source file's extraction order.
    #[serde(skip)]
    pub source_index: usize,
}

/// Default intensity when the source carries no score.
pub const DEFAULT_INTENSITY: f64 = 0.75;

impl InsightRecord {
    /// Creates a record with default category, intensity, and provenance.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: "general".to_string(),
            topic_key: String::new(),
            intensity: DEFAULT_INTENSITY,
            triggers: Vec::new(),
            supports: Vec::new(),
            challenges: Vec::new(),
            source_file: None,
            source_index: 0,
        }
    }

    /// The record's location for duplicate reporting.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            source: self.source_file.clone().unwrap_or_default(),
            index: self.source_index,
        }
    }
}

/// Where a record came from: file plus index within that file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub source: String,
    pub index: usize,
}

/// A group of records whose normalized text is identical (similarity 1.0)
/// or whose similarity ratio exceeds the near-duplicate threshold.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateSet {
    /// The text of the first member encountered.
    pub canonical_text: String,
    /// Every member's location, in encounter order.
    pub locations: Vec<SourceLocation>,
    /// 1.0 for exact groups; the weakest pairwise ratio for near groups.
    pub similarity: f64,
}

impl DuplicateSet {
    /// Number of records in the set.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True when the set holds fewer than two members (should not occur
    /// in reports).
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
