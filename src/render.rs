//! JSON rendering of normalized documents.

use crate::error::Result;
use crate::model::NormalizedDocument;
use std::path::Path;

/// Renders a document as pretty-printed JSON (2-space indent).
pub fn render_document(document: &NormalizedDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Renders a document as compact JSON.
pub fn render_document_compact(document: &NormalizedDocument) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

/// Renders a document and writes it to a file.
///
/// The content is fully rendered in memory before the write, so a
/// rendering failure leaves the target untouched.
pub fn render_to_file(document: &NormalizedDocument, path: impl AsRef<Path>) -> Result<()> {
    let content = render_document(document)?;
    std::fs::write(path, content)?;
    Ok(())
}
