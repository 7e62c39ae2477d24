//! # inorm
//!
//! A library for repairing, normalizing, and deduplicating generated
//! "insight" content files: the ad-hoc JSON (sometimes markdown-wrapped)
//! that an upstream export pipeline produces for numerology and astrology
//! topics.
//!
//! ## Pipeline
//!
//! raw file → sanitize → parse (structural repair on failure) → schema
//! detection → extraction into canonical records → duplicate audit →
//! report or rewritten file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inorm::{normalize_file, render_document};
//!
//! fn main() -> inorm::Result<()> {
//!     let document = normalize_file("SU7.md")?;
//!     println!("{}", render_document(&document)?);
//!     Ok(())
//! }
//! ```
//!
//! Every stage is also available directly ([`sanitize`], [`repair`],
//! [`detect`], [`extract`], [`find_duplicates`]) for callers that need
//! only part of the pipeline.

pub mod dedup;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod repair;
pub mod sanitize;
pub mod topic;

// Re-exports
pub use dedup::{eliminate, find_duplicates, normalize_comparison_text, DedupOptions, DedupReport};
pub use detect::{detect, SchemaKind};
pub use error::{Error, RepairError, Result};
pub use extract::{extract, CategoryMapper, ExtractOptions};
pub use model::{
    BatchSummary, DuplicateSet, FileFailure, InsightRecord, NormalizedDocument, SourceLocation,
};
pub use pipeline::{
    normalize_to_file, process_file, process_str, run_batch, BatchReport, FileReport,
    PipelineOptions,
};
pub use render::{render_document, render_document_compact, render_to_file};
pub use repair::repair;
pub use sanitize::{sanitize, sanitize_default, SanitizeOptions};
pub use topic::TopicKey;

use std::path::Path;

/// Normalizes a single source file into the canonical output document.
///
/// # Example
///
/// ```no_run
/// use inorm::normalize_file;
///
/// let document = normalize_file("NumberMessages_Complete_5.json")?;
/// println!("{} records", document.record_count());
/// # Ok::<(), inorm::Error>(())
/// ```
pub fn normalize_file(path: impl AsRef<Path>) -> Result<NormalizedDocument> {
    let report = process_file(path, &PipelineOptions::default())?;
    Ok(report.document)
}

/// Runs the duplicate audit on a single source file.
pub fn audit_file(path: impl AsRef<Path>) -> Result<DedupReport> {
    let options = PipelineOptions::default().with_dedup(true);
    let report = process_file(path, &options)?;
    match report.dedup {
        Some(dedup) => Ok(dedup),
        None => Ok(find_duplicates(
            &report.document.behavioral_insights,
            &options.dedup,
        )),
    }
}

/// Builder for configuring and running the normalization pipeline.
///
/// # Example
///
/// ```no_run
/// use inorm::Inorm;
///
/// let normalized = Inorm::new()
///     .with_dedup(true)
///     .with_behavioral_category("core_analysis")
///     .process("SU7.md")?;
/// normalized.write_to("SU7_normalized.json")?;
/// # Ok::<(), inorm::Error>(())
/// ```
pub struct Inorm {
    options: PipelineOptions,
}

impl Default for Inorm {
    fn default() -> Self {
        Self::new()
    }
}

impl Inorm {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            options: PipelineOptions::default(),
        }
    }

    /// Enables or disables the duplicate audit.
    pub fn with_dedup(mut self, run: bool) -> Self {
        self.options.run_dedup = run;
        self
    }

    /// Sets the near-duplicate similarity threshold.
    pub fn with_near_threshold(mut self, threshold: f64) -> Self {
        self.options.dedup.near_threshold = threshold;
        self
    }

    /// Sets the per-file record cap.
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.options.extract.max_records = max;
        self
    }

    /// Sets the behavioral category stamped on output documents.
    pub fn with_behavioral_category(mut self, category: impl Into<String>) -> Self {
        self.options.behavioral_category = category.into();
        self
    }

    /// Supplies an alternate category synonym table.
    pub fn with_category_mapper(mut self, mapper: CategoryMapper) -> Self {
        self.options.extract.mapper = mapper;
        self
    }

    /// Persists attempted repairs of unparsable files for inspection.
    pub fn keep_failed_repairs(mut self) -> Self {
        self.options.persist_failed_repairs = true;
        self
    }

    /// Runs the pipeline on one file.
    pub fn process(self, path: impl AsRef<Path>) -> Result<NormalizedFile> {
        let report = process_file(path, &self.options)?;
        Ok(NormalizedFile { report })
    }

    /// Runs the pipeline over a directory.
    pub fn process_dir(self, dir: impl AsRef<Path>) -> Result<BatchReport> {
        run_batch(dir, &self.options)
    }
}

/// A normalized file ready for rendering or inspection.
pub struct NormalizedFile {
    report: FileReport,
}

impl NormalizedFile {
    /// The underlying file report.
    pub fn report(&self) -> &FileReport {
        &self.report
    }

    /// The normalized output document.
    pub fn document(&self) -> &NormalizedDocument {
        &self.report.document
    }

    /// The uniqueness score, when the audit ran.
    pub fn uniqueness_score(&self) -> Option<f64> {
        self.report.dedup.as_ref().map(|d| d.uniqueness_score)
    }

    /// Renders the document as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        render_document(&self.report.document)
    }

    /// Writes the rendered document to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        render_to_file(&self.report.document, path)
    }

    /// Consumes self and returns the report.
    pub fn into_report(self) -> FileReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==================== End-to-End Scenarios ====================

    #[test]
    fn test_scenario_repair_newline_separated_export() {
        // Malformed export: newline-separated tokens, unquoted trailing
        // value
        let input = "{\n\"a\":\n1,\n\"b\":\ntext}\n";
        let repaired = repair(input).unwrap();
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value, json!({"a": 1, "b": "text"}));
    }

    #[test]
    fn test_scenario_category_mapping() {
        let raw = r#"{"categories": {"stress": [{"text": "Breathe deeply and notice tension leaving your body."}]}}"#;
        let report = process_str("input.json", raw, None, &PipelineOptions::default()).unwrap();
        let record = &report.document.behavioral_insights[0];
        assert_eq!(record.category, "stressResponse");
        assert_eq!(
            record.text,
            "Breathe deeply and notice tension leaving your body."
        );
    }

    #[test]
    fn test_scenario_number_keyed_direct() {
        let raw = r#"{"1": {"insight": ["Insight text number one is long enough to pass."]}}"#;
        let report = process_str("input.json", raw, None, &PipelineOptions::default()).unwrap();
        assert_eq!(report.schema, SchemaKind::NumberKeyedDirectCategories);
        assert_eq!(report.record_count(), 1);
        assert_eq!(report.document.behavioral_insights[0].topic_key, "1");
    }

    #[test]
    fn test_scenario_full_pipeline_with_duplicates() {
        let raw = r#"{
            "categories": {
                "stress": [
                    "Tension releases the moment you name it honestly.",
                    "Tension releases the moment you name it honestly."
                ],
                "work": ["A separate thought about pacing your workload."]
            }
        }"#;
        let report = process_str(
            "SU4.md",
            raw,
            Some(TopicKey::Number(4)),
            &PipelineOptions::default(),
        )
        .unwrap();

        let dedup = report.dedup.as_ref().unwrap();
        assert_eq!(dedup.sets.len(), 1);
        assert_eq!(dedup.total, 3);
        assert_eq!(dedup.unique, 2);
        assert!(!dedup.meets(0.98));
    }

    // ==================== Builder API ====================

    #[test]
    fn test_builder_configures_options() {
        let builder = Inorm::new()
            .with_dedup(false)
            .with_near_threshold(0.9)
            .with_max_records(10)
            .with_behavioral_category("custom_analysis");
        assert!(!builder.options.run_dedup);
        assert_eq!(builder.options.dedup.near_threshold, 0.9);
        assert_eq!(builder.options.extract.max_records, 10);
        assert_eq!(builder.options.behavioral_category, "custom_analysis");
    }

    #[test]
    fn test_builder_process_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SU8.json");
        std::fs::write(
            &path,
            r#"{"categories": {"growth": ["Momentum gathers behind consistent small actions."]}}"#,
        )
        .unwrap();

        let normalized = Inorm::new().process(&path).unwrap();
        assert_eq!(normalized.document().number, 8);
        assert_eq!(normalized.uniqueness_score(), Some(1.0));
        assert!(normalized.to_json().unwrap().contains("personalGrowth"));
    }

    #[test]
    fn test_error_display() {
        let error = Error::UnknownTopic("odd_file.json".to_string());
        assert!(error.to_string().contains("odd_file.json"));
    }
}
