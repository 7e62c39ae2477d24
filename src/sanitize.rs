//! Text sanitization for raw exported insight files.
//!
//! Fixes character-level artifacts left behind by the upstream export
//! pipeline before any structural parsing is attempted:
//!
//! - Unicode smart quotes used as JSON string delimiters
//! - escaped `\[` / `\]` sequences around array tokens
//! - the fixed markdown wrapper header (`# SU<n>` / `## SU<n>`)
//! - runs of blank or whitespace-only lines
//!
//! Sanitization is a pure function over the input text and is idempotent:
//! `sanitize(sanitize(x)) == sanitize(x)`.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Sanitize configuration options.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Strip the markdown wrapper header lines (`# SU<n>` / `## SU<n>`).
    pub strip_markdown_headers: bool,
    /// Collapse runs of blank lines to a single blank line.
    pub collapse_blank_lines: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            strip_markdown_headers: true,
            collapse_blank_lines: true,
        }
    }
}

impl SanitizeOptions {
    /// Creates options for raw JSON sources with no markdown wrapper.
    pub fn raw_json() -> Self {
        Self {
            strip_markdown_headers: false,
            collapse_blank_lines: true,
        }
    }
}

static RE_SU_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,2}\s*SU\d+\s*$").unwrap());

/// Sanitizes raw source text.
///
/// Always returns a string, possibly unchanged. No error conditions.
pub fn sanitize(raw: &str, options: &SanitizeOptions) -> String {
    // Unicode NFC normalization plus smart-quote folding
    let mut result = String::with_capacity(raw.len());
    for c in raw.nfc() {
        match c {
            '\u{201C}' | '\u{201D}' => result.push('"'),
            '\u{2018}' | '\u{2019}' => result.push('\''),
            _ => result.push(c),
        }
    }

    // Export artifact: literal backslash-escaped brackets
    let result = result.replace("\\[", "[").replace("\\]", "]");

    let result = if options.strip_markdown_headers {
        RE_SU_HEADER.replace_all(&result, "").into_owned()
    } else {
        result
    };

    if options.collapse_blank_lines {
        collapse_blank_lines(&result)
    } else {
        result
    }
}

/// Runs [`sanitize`] with default options.
pub fn sanitize_default(raw: &str) -> String {
    sanitize(raw, &SanitizeOptions::default())
}

fn collapse_blank_lines(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = false;

    for line in input.lines() {
        if line.trim().is_empty() {
            if !blank_run && !out.is_empty() {
                out.push("");
            }
            blank_run = true;
        } else {
            out.push(line);
            blank_run = false;
        }
    }

    // Drop a trailing blank line left by a run at end of input
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    out.join("\n")
}
