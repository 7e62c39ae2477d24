//! Error types for the inorm library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for inorm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the inorm library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Sanitized text is not valid JSON and no repair pattern applied.
    #[error(transparent)]
    Repair(#[from] RepairError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source directory given to a batch run does not exist.
    #[error("Source directory not found: {0}")]
    MissingSourceDir(PathBuf),

    /// A topic key was required but could not be inferred.
    #[error("Topic key could not be inferred: {0}")]
    UnknownTopic(String),

    /// A duplicate-elimination replacement was rejected.
    #[error("Invalid replacement text: {0}")]
    InvalidReplacement(String),
}

/// Failure of the structural repair pipeline.
///
/// Both the original input and the text after the last attempted rewrite
/// are preserved so the caller can persist them for manual diagnosis
/// instead of silently dropping the file.
#[derive(Error, Debug, Clone)]
#[error("Repair failed: {reason}")]
pub struct RepairError {
    /// The parse error message after all rewrite rules were applied.
    pub reason: String,
    /// The text as it was before any rewrite.
    pub original: String,
    /// The text after the last rewrite rule ran.
    pub attempted: String,
}
