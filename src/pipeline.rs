//! The batch pipeline.
//!
//! Per file: read → sanitize → parse (repair on failure) → detect →
//! extract → dedupe → render. Per batch: per-file failures never abort
//! the run; they are collected into the [`BatchSummary`] printed at the
//! end.
//!
//! The file contract is read-entire / transform-in-memory / write-entire:
//! a failed transform leaves the original file untouched.

use crate::dedup::{find_duplicates, DedupOptions, DedupReport};
use crate::detect::{detect, SchemaKind};
use crate::error::{Error, Result};
use crate::extract::{extract, ExtractOptions};
use crate::model::{BatchSummary, FileFailure, NormalizedDocument};
use crate::repair::parse_or_repair;
use crate::sanitize::{sanitize, SanitizeOptions};
use crate::topic::{self, TopicKey};
use std::fs;
use std::path::{Path, PathBuf};

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub sanitize: SanitizeOptions,
    pub extract: ExtractOptions,
    pub dedup: DedupOptions,
    /// Run the duplicate audit after extraction.
    pub run_dedup: bool,
    /// Constant describing the analysis type, stamped on every output
    /// document.
    pub behavioral_category: String,
    /// On repair failure, write the attempted text next to the source
    /// for manual inspection.
    pub persist_failed_repairs: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            sanitize: SanitizeOptions::default(),
            extract: ExtractOptions::default(),
            dedup: DedupOptions::default(),
            run_dedup: true,
            behavioral_category: "behavioral_analysis".to_string(),
            persist_failed_repairs: false,
        }
    }
}

impl PipelineOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the duplicate audit.
    pub fn with_dedup(mut self, run: bool) -> Self {
        self.run_dedup = run;
        self
    }

    /// Sets the behavioral category constant.
    pub fn with_behavioral_category(mut self, category: impl Into<String>) -> Self {
        self.behavioral_category = category.into();
        self
    }

    /// Persists attempted repairs of unparsable files.
    pub fn keep_failed_repairs(mut self) -> Self {
        self.persist_failed_repairs = true;
        self
    }
}

/// Outcome of normalizing one source file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// The source path (or synthetic name for in-memory input).
    pub path: PathBuf,
    /// Detected schema kind.
    pub schema: SchemaKind,
    /// Resolved topic, when one was found.
    pub topic: Option<TopicKey>,
    /// True when the structural repairer had to run.
    pub repaired: bool,
    /// The normalized output document.
    pub document: NormalizedDocument,
    /// The duplicate audit, when it ran.
    pub dedup: Option<DedupReport>,
}

impl FileReport {
    /// Number of extracted records.
    pub fn record_count(&self) -> usize {
        self.document.record_count()
    }
}

/// Outcome of a batch run: per-file reports plus the summary.
#[derive(Debug)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub files: Vec<FileReport>,
}

/// Runs the pipeline over in-memory text.
///
/// `source_name` is used for provenance; `file_topic` is the
/// filename-derived topic, which the document's own `number` field
/// overrides.
pub fn process_str(
    source_name: &str,
    raw: &str,
    file_topic: Option<TopicKey>,
    options: &PipelineOptions,
) -> Result<FileReport> {
    let sanitized = sanitize(raw, &options.sanitize);
    let (value, repaired) = parse_or_repair(&sanitized)?;
    let schema = detect(&value);

    let topic = TopicKey::from_document(&value).or(file_topic);
    let fallback = topic.as_ref().map(TopicKey::to_string);
    let mut records = extract(&value, schema, fallback.as_deref(), &options.extract);
    for record in &mut records {
        record.source_file = Some(source_name.to_string());
    }

    let dedup = options
        .run_dedup
        .then(|| find_duplicates(&records, &options.dedup));

    let document =
        NormalizedDocument::from_records(topic.as_ref(), &options.behavioral_category, records);

    Ok(FileReport {
        path: PathBuf::from(source_name),
        schema,
        topic,
        repaired,
        document,
        dedup,
    })
}

/// Runs the pipeline over one file on disk.
pub fn process_file(path: impl AsRef<Path>, options: &PipelineOptions) -> Result<FileReport> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let file_topic = topic::infer_from_path(path);
    let name = path.to_string_lossy().into_owned();

    match process_str(&name, &raw, file_topic, options) {
        Ok(report) => Ok(report),
        Err(Error::Repair(repair_error)) => {
            if options.persist_failed_repairs {
                let attempt_path = path.with_extension("attempted.json");
                // Best effort; the repair error is the one worth surfacing
                let _ = fs::write(&attempt_path, &repair_error.attempted);
            }
            Err(Error::Repair(repair_error))
        }
        Err(other) => Err(other),
    }
}

/// Runs the pipeline over every `.json`/`.md` file in a directory.
///
/// A missing directory is the only fatal condition; individual file
/// failures are recorded in the summary and processing continues.
pub fn run_batch(dir: impl AsRef<Path>, options: &PipelineOptions) -> Result<BatchReport> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::MissingSourceDir(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("json") | Some("md")
            )
        })
        .collect();
    paths.sort();

    let mut summary = BatchSummary::default();
    let mut files = Vec::new();
    let mut audited_total = 0usize;
    let mut audited_unique = 0usize;

    for path in paths {
        match process_file(&path, options) {
            Ok(report) => {
                summary.files_processed += 1;
                summary.records_extracted += report.record_count();
                if let Some(ref dedup) = report.dedup {
                    summary.duplicates_found += dedup.duplicate_count();
                    audited_total += dedup.total;
                    audited_unique += dedup.unique;
                }
                if report.topic.is_none() {
                    summary
                        .unresolved_topics
                        .push(path.to_string_lossy().into_owned());
                }
                files.push(report);
            }
            Err(error) => {
                summary.files_failed += 1;
                summary.failures.push(FileFailure {
                    path: path.to_string_lossy().into_owned(),
                    reason: error.to_string(),
                });
            }
        }
    }

    if audited_total > 0 {
        summary.uniqueness_score = Some(audited_unique as f64 / audited_total as f64);
    }

    Ok(BatchReport { summary, files })
}

/// Normalizes a file and writes the output document.
///
/// The document is fully rendered before the write; failures leave the
/// target untouched.
pub fn normalize_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &PipelineOptions,
) -> Result<FileReport> {
    let report = process_file(input, options)?;
    crate::render::render_to_file(&report.document, output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_process_str_markdown_wrapped_corrupt_json() {
        // Markdown header, smart quotes, newline-separated tokens
        let raw = "# SU7\n\n{\n\u{201C}categories\u{201D}:\n{\n\u{201C}stress\u{201D}:\n[\u{201C}Slow breathing restores your natural rhythm daily.\u{201D}]\n}\n}\n";
        let report = process_str(
            "SU7.md",
            raw,
            Some(TopicKey::Number(7)),
            &PipelineOptions::default(),
        )
        .unwrap();

        assert_eq!(report.schema, SchemaKind::CategoriesWrapper);
        // Sanitization alone makes this parse; no repair pass needed
        assert!(!report.repaired);
        assert_eq!(report.record_count(), 1);
        assert_eq!(report.document.number, 7);
        let record = &report.document.behavioral_insights[0];
        assert_eq!(record.category, "stressResponse");
        assert_eq!(record.topic_key, "7");
        assert_eq!(record.source_file.as_deref(), Some("SU7.md"));
    }

    #[test]
    fn test_document_number_overrides_file_topic() {
        let raw = r#"{"number": 3, "categories": {"general": ["The document number wins over the filename."]}}"#;
        let report = process_str(
            "SU9.md",
            raw,
            Some(TopicKey::Number(9)),
            &PipelineOptions::default(),
        )
        .unwrap();
        assert_eq!(report.document.number, 3);
    }

    #[test]
    fn test_dedup_can_be_disabled() {
        let raw = r#"{"categories": {"general": ["One sufficiently long insight text."]}}"#;
        let options = PipelineOptions::default().with_dedup(false);
        let report = process_str("x.json", raw, None, &options).unwrap();
        assert!(report.dedup.is_none());
    }

    #[test]
    fn test_batch_continues_past_bad_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("SU1.json"),
            r#"{"categories": {"stress": ["A good record that extracts without trouble."]}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "%%% not even close %%%").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored extension").unwrap();

        let report = run_batch(dir.path(), &PipelineOptions::default()).unwrap();
        assert_eq!(report.summary.files_processed, 1);
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.summary.records_extracted, 1);
        assert_eq!(report.summary.failures.len(), 1);
        assert!(report.summary.failures[0].path.contains("broken.json"));
    }

    #[test]
    fn test_batch_missing_directory_is_fatal() {
        let result = run_batch("/no/such/directory/anywhere", &PipelineOptions::default());
        assert!(matches!(result, Err(Error::MissingSourceDir(_))));
    }

    #[test]
    fn test_batch_reports_unresolved_topics() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("mystery.json"),
            r#"{"categories": {"general": ["No filename pattern and no number field."]}}"#,
        )
        .unwrap();
        let report = run_batch(dir.path(), &PipelineOptions::default()).unwrap();
        assert_eq!(report.summary.unresolved_topics.len(), 1);
    }

    #[test]
    fn test_persist_failed_repair_writes_attempt() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.json");
        fs::write(&source, "{{{{ not json at all ::::").unwrap();

        let options = PipelineOptions::default().keep_failed_repairs();
        let result = process_file(&source, &options);
        assert!(result.is_err());
        assert!(dir.path().join("broken.attempted.json").exists());
        // Original must be untouched
        assert_eq!(
            fs::read_to_string(&source).unwrap(),
            "{{{{ not json at all ::::"
        );
    }

    #[test]
    fn test_normalize_to_file_writes_pretty_json() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("SU5.json");
        let output = dir.path().join("SU5_normalized.json");
        fs::write(
            &input,
            r#"{"categories": {"work": ["Steady effort compounds into lasting momentum."]}}"#,
        )
        .unwrap();

        let report =
            normalize_to_file(&input, &output, &PipelineOptions::default()).unwrap();
        assert_eq!(report.record_count(), 1);

        let written = fs::read_to_string(&output).unwrap();
        let parsed: NormalizedDocument = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.number, 5);
        assert_eq!(parsed.behavioral_insights[0].category, "workStyle");
    }
}
