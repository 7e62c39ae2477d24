//! Similarity-based duplicate detection for extracted insight records.
//!
//! Two phases over one logical collection (per number, planet, or sign;
//! never the whole corpus, to keep the pairwise cost bounded):
//!
//! 1. **Exact phase**: group by normalized text; groups with more than
//!    one member are exact duplicate sets at similarity 1.0.
//! 2. **Near phase**: pairwise `normalized_levenshtein` over the
//!    remaining texts; a pair is flagged iff its ratio is strictly
//!    greater than the configured threshold.
//!
//! Reporting never deletes content. Eliminating a duplicate is the
//! separate, explicit [`eliminate`] operation.

use crate::error::{Error, Result};
use crate::model::{DuplicateSet, InsightRecord};
use serde::Serialize;
use std::collections::HashMap;
use strsim::normalized_levenshtein;

/// Dedup configuration. Both thresholds are policy values carried from
/// the content pipeline, not algorithmic necessities, so they stay
/// configurable.
#[derive(Debug, Clone)]
pub struct DedupOptions {
    /// A pair is a near-duplicate iff similarity is strictly greater
    /// than this.
    pub near_threshold: f64,
    /// Minimum uniqueness score for a collection to pass the audit.
    pub acceptance_score: f64,
    /// Disable the O(n²) near phase (exact grouping only).
    pub near_phase: bool,
    /// Replacement text must be strictly longer than this many chars.
    pub min_replacement_chars: usize,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            near_threshold: 0.80,
            acceptance_score: 0.98,
            near_phase: true,
            min_replacement_chars: 10,
        }
    }
}

impl DedupOptions {
    /// Sets the near-duplicate threshold.
    pub fn with_near_threshold(mut self, threshold: f64) -> Self {
        self.near_threshold = threshold;
        self
    }

    /// Sets the uniqueness acceptance bar.
    pub fn with_acceptance_score(mut self, score: f64) -> Self {
        self.acceptance_score = score;
        self
    }

    /// Disables the pairwise near phase.
    pub fn exact_only(mut self) -> Self {
        self.near_phase = false;
        self
    }
}

/// Result of a duplicate audit over one collection.
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    /// Every duplicate set found, in first-encounter order.
    pub sets: Vec<DuplicateSet>,
    /// Total records audited.
    pub total: usize,
    /// Records whose normalized text has no duplicate, plus one
    /// representative per duplicate set.
    pub unique: usize,
    /// `unique / total` (1.0 for an empty collection).
    pub uniqueness_score: f64,
}

impl DedupReport {
    /// Number of redundant records (total minus unique).
    pub fn duplicate_count(&self) -> usize {
        self.total - self.unique
    }

    /// True when the collection meets the acceptance bar.
    pub fn meets(&self, acceptance_score: f64) -> bool {
        self.uniqueness_score >= acceptance_score
    }
}

/// Normalizes text for duplicate comparison: lowercase, smart quotes and
/// en/em dashes folded to ASCII, whitespace collapsed to single spaces.
pub fn normalize_comparison_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let c = match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{2013}' | '\u{2014}' => '-',
            c => c,
        };
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Finds exact and near duplicate sets in one collection of records.
pub fn find_duplicates(records: &[InsightRecord], options: &DedupOptions) -> DedupReport {
    let total = records.len();

    // Exact phase: group by normalized text, preserving first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let key = normalize_comparison_text(&record.text);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(idx);
    }

    let mut sets: Vec<DuplicateSet> = Vec::new();
    let mut singles: Vec<(String, usize)> = Vec::new();
    for key in &order {
        let members = &groups[key];
        if members.len() > 1 {
            sets.push(DuplicateSet {
                canonical_text: records[members[0]].text.clone(),
                locations: members.iter().map(|&i| records[i].location()).collect(),
                similarity: 1.0,
            });
        } else {
            singles.push((key.clone(), members[0]));
        }
    }

    // Near phase: pairwise over texts not already grouped exactly
    if options.near_phase {
        let mut assigned: Vec<Option<usize>> = vec![None; singles.len()];
        for i in 0..singles.len() {
            for j in (i + 1)..singles.len() {
                let ratio = normalized_levenshtein(&singles[i].0, &singles[j].0);
                if ratio <= options.near_threshold {
                    continue;
                }
                match (assigned[i], assigned[j]) {
                    (None, None) => {
                        sets.push(DuplicateSet {
                            canonical_text: records[singles[i].1].text.clone(),
                            locations: vec![
                                records[singles[i].1].location(),
                                records[singles[j].1].location(),
                            ],
                            similarity: ratio,
                        });
                        let set_idx = sets.len() - 1;
                        assigned[i] = Some(set_idx);
                        assigned[j] = Some(set_idx);
                    }
                    (Some(set_idx), None) => {
                        sets[set_idx].locations.push(records[singles[j].1].location());
                        sets[set_idx].similarity = sets[set_idx].similarity.min(ratio);
                        assigned[j] = Some(set_idx);
                    }
                    (None, Some(set_idx)) => {
                        sets[set_idx].locations.push(records[singles[i].1].location());
                        sets[set_idx].similarity = sets[set_idx].similarity.min(ratio);
                        assigned[i] = Some(set_idx);
                    }
                    // Both already flagged; sets stay as first formed
                    (Some(_), Some(_)) => {}
                }
            }
        }
    }

    let redundant: usize = sets.iter().map(|s| s.len() - 1).sum();
    let unique = total - redundant;
    let uniqueness_score = if total == 0 {
        1.0
    } else {
        unique as f64 / total as f64
    };

    DedupReport {
        sets,
        total,
        unique,
        uniqueness_score,
    }
}

/// Replaces one duplicate member's text with a supplied alternative,
/// preserving every other field of the record.
///
/// The replacement is rejected when it is too short or when it would
/// itself duplicate an existing record's normalized text.
pub fn eliminate(
    records: &mut [InsightRecord],
    index: usize,
    replacement: &str,
    options: &DedupOptions,
) -> Result<()> {
    if index >= records.len() {
        return Err(Error::InvalidReplacement(format!(
            "record index {} out of bounds ({} records)",
            index,
            records.len()
        )));
    }

    let replacement = replacement.trim();
    if replacement.chars().count() <= options.min_replacement_chars {
        return Err(Error::InvalidReplacement(format!(
            "replacement must be longer than {} characters",
            options.min_replacement_chars
        )));
    }

    let normalized = normalize_comparison_text(replacement);
    if records
        .iter()
        .enumerate()
        .any(|(i, r)| i != index && normalize_comparison_text(&r.text) == normalized)
    {
        return Err(Error::InvalidReplacement(
            "replacement would reintroduce a duplicate".to_string(),
        ));
    }

    records[index].text = replacement.to_string();
    Ok(())
}
