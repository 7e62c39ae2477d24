//! Output document shape and batch accounting.

use super::InsightRecord;
use crate::topic::TopicKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical output document written for each normalized source file.
///
/// This is exactly the shape the downstream document-store publisher
/// consumes; no store-specific field typing is embedded here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDocument {
    /// The topic number, or 0 when the topic is a planet or sign (the
    /// title carries the name in that case).
    pub number: i64,
    pub title: String,
    /// Constant describing the analysis type for this run.
    pub behavioral_category: String,
    pub behavioral_insights: Vec<InsightRecord>,
}

impl NormalizedDocument {
    /// Assembles the output document for one source file.
    pub fn from_records(
        topic: Option<&TopicKey>,
        behavioral_category: &str,
        records: Vec<InsightRecord>,
    ) -> Self {
        let number = topic
            .and_then(TopicKey::as_number)
            .map(i64::from)
            .unwrap_or(0);
        let title = match topic {
            Some(TopicKey::Number(n)) => format!("Number {} Behavioral Insights", n),
            Some(topic) => format!("{} Behavioral Insights", topic),
            None => "Behavioral Insights".to_string(),
        };
        Self {
            number,
            title,
            behavioral_category: behavioral_category.to_string(),
            behavioral_insights: records,
        }
    }

    /// Number of insight records in the document.
    pub fn record_count(&self) -> usize {
        self.behavioral_insights.len()
    }
}

/// One failed file in a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// End-of-run accounting for a batch.
///
/// Per-file failures never abort the batch; they are collected here and
/// the summary is printed at the end of every run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub records_extracted: usize,
    pub duplicates_found: usize,
    pub duplicates_removed: usize,
    /// Aggregate uniqueness across all audited records, when dedup ran.
    pub uniqueness_score: Option<f64>,
    pub failures: Vec<FileFailure>,
    /// Files whose topic could not be inferred from filename or content.
    pub unresolved_topics: Vec<String>,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Files processed:   {} ({} failed)",
            self.files_processed, self.files_failed
        )?;
        writeln!(f, "Records extracted: {}", self.records_extracted)?;
        writeln!(
            f,
            "Duplicates found:  {} ({} removed)",
            self.duplicates_found, self.duplicates_removed
        )?;
        match self.uniqueness_score {
            Some(score) => writeln!(f, "Uniqueness score:  {:.2}%", score * 100.0)?,
            None => writeln!(f, "Uniqueness score:  n/a")?,
        }
        for failure in &self.failures {
            writeln!(f, "  failed: {} ({})", failure.path, failure.reason)?;
        }
        for path in &self.unresolved_topics {
            writeln!(f, "  topic unresolved: {}", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_title_for_number() {
        let doc = NormalizedDocument::from_records(
            Some(&TopicKey::Number(7)),
            "behavioral_analysis",
            vec![],
        );
        assert_eq!(doc.number, 7);
        assert_eq!(doc.title, "Number 7 Behavioral Insights");
    }

    #[test]
    fn test_document_title_for_sign() {
        let doc = NormalizedDocument::from_records(
            Some(&TopicKey::Sign("Leo".into())),
            "behavioral_analysis",
            vec![],
        );
        assert_eq!(doc.number, 0);
        assert_eq!(doc.title, "Leo Behavioral Insights");
    }

    #[test]
    fn test_document_without_topic() {
        let doc = NormalizedDocument::from_records(None, "behavioral_analysis", vec![]);
        assert_eq!(doc.number, 0);
        assert_eq!(doc.title, "Behavioral Insights");
    }

    #[test]
    fn test_summary_display_includes_counts() {
        let summary = BatchSummary {
            files_processed: 3,
            files_failed: 1,
            records_extracted: 42,
            duplicates_found: 2,
            duplicates_removed: 0,
            uniqueness_score: Some(0.9876),
            failures: vec![FileFailure {
                path: "bad.json".into(),
                reason: "Repair failed".into(),
            }],
            unresolved_topics: vec!["mystery.json".into()],
        };
        let text = summary.to_string();
        assert!(text.contains("Files processed:   3 (1 failed)"));
        assert!(text.contains("Records extracted: 42"));
        assert!(text.contains("98.76%"));
        assert!(text.contains("bad.json"));
        assert!(text.contains("mystery.json"));
    }
}
