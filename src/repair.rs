//! Structural repair of malformed quasi-JSON text.
//!
//! The upstream export pipeline produces a small set of known corruption
//! modes: a newline between every token, missing quotes around property
//! names, bare word values, and string values missing their closing quote.
//! Each mode has one matching rewrite rule below.
//!
//! Rules are pure text transforms applied in a fixed order, with a parse
//! re-attempted after each one; the pipeline returns as soon as the text
//! parses. Already-valid JSON is returned unchanged, which makes repair a
//! no-op on its own output.

use crate::error::RepairError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A single named, pure text-rewrite rule.
pub struct RepairRule {
    /// Rule identifier used in diagnostics.
    pub name: &'static str,
    transform: fn(&str) -> String,
}

impl RepairRule {
    /// Applies the rewrite to `text`, returning the rewritten string.
    pub fn apply(&self, text: &str) -> String {
        (self.transform)(text)
    }
}

/// The ordered repair rule list. Order matters: later rules assume the
/// spacing and quoting produced by earlier ones.
pub static REPAIR_RULES: &[RepairRule] = &[
    RepairRule {
        name: "join-lines",
        transform: join_lines,
    },
    RepairRule {
        name: "space-after-colon",
        transform: space_after_colon,
    },
    RepairRule {
        name: "quote-bare-keys",
        transform: quote_bare_keys,
    },
    RepairRule {
        name: "quote-bare-values",
        transform: quote_bare_values,
    },
    RepairRule {
        name: "close-unterminated-strings",
        transform: close_unterminated_strings,
    },
];

/// Repairs malformed quasi-JSON text.
///
/// Returns the first rewrite under which the text parses. Valid input is
/// returned unchanged. If no rule sequence produces parsable JSON the
/// error carries both the original and the last attempted text.
pub fn repair(text: &str) -> Result<String, RepairError> {
    if parses(text) {
        return Ok(text.to_string());
    }

    let mut current = text.to_string();
    for rule in REPAIR_RULES {
        current = rule.apply(&current);
        if parses(&current) {
            return Ok(current);
        }
    }

    let reason = match serde_json::from_str::<serde_json::Value>(&current) {
        Err(e) => e.to_string(),
        Ok(_) => "unknown".to_string(),
    };
    Err(RepairError {
        reason,
        original: text.to_string(),
        attempted: current,
    })
}

/// Parses text directly, falling back to the repair pipeline on failure.
///
/// The boolean is true when a repair pass was needed.
pub fn parse_or_repair(text: &str) -> Result<(serde_json::Value, bool), RepairError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok((value, false));
    }
    let repaired = repair(text)?;
    let value = serde_json::from_str(&repaired).map_err(|e| RepairError {
        reason: e.to_string(),
        original: text.to_string(),
        attempted: repaired.clone(),
    })?;
    Ok((value, true))
}

fn parses(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

// ============================================================================
// Rewrite rules
// ============================================================================

/// The export inserts a newline between every JSON token. Joining all
/// non-blank lines into one compact string restores token adjacency.
fn join_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .concat()
}

static RE_COLON_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"":(\S)"#).unwrap());

/// Normalizes `":x` to `": x` so the value-token rules below can anchor
/// on a single space after the key.
fn space_after_colon(text: &str) -> String {
    RE_COLON_VALUE.replace_all(text, "\": ${1}").into_owned()
}

static RE_BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap());

/// Quotes bare property names appearing after `{` or `,`.
fn quote_bare_keys(text: &str) -> String {
    RE_BARE_KEY.replace_all(text, "${1}\"${2}\":").into_owned()
}

static RE_BARE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":\s*([A-Za-z_][A-Za-z0-9_' -]*?)\s*([,}\]])"#).unwrap());

/// Wraps an unquoted word value (before `,`, `}`, or `]`) in quotes.
/// JSON keywords are left alone.
fn quote_bare_values(text: &str) -> String {
    RE_BARE_VALUE
        .replace_all(text, |caps: &Captures| {
            let word = &caps[1];
            if matches!(word, "true" | "false" | "null") {
                caps[0].to_string()
            } else {
                format!(": \"{}\"{}", word, &caps[2])
            }
        })
        .into_owned()
}

static RE_UNTERMINATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(:\s*"[^"]*)([}\]])"#).unwrap());

/// Inserts the missing closing quote of a string value that runs directly
/// into a `}` or `]` (truncated value heuristic).
fn close_unterminated_strings(text: &str) -> String {
    RE_UNTERMINATED.replace_all(text, "${1}\"${2}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_valid_json_is_untouched() {
        let input = r#"{"a": 1, "b": "text", "c": [true, null]}"#;
        let result = repair(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_newline_whitespace_alone_is_valid() {
        // Newlines between tokens are plain whitespace; no rewrite runs
        let input = "{\n\"a\":\n1,\n\"b\":\n2\n}\n";
        let result = repair(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_bare_trailing_value() {
        // End-to-end scenario: newline-separated with an unquoted
        // trailing token
        let input = "{\n\"a\":\n1,\n\"b\":\ntext}\n";
        let result = repair(input).unwrap();
        assert_eq!(parse(&result), json!({"a": 1, "b": "text"}));
    }

    #[test]
    fn test_bare_property_names() {
        let input = "{a: 1, b_key: \"x\"}";
        let result = repair(input).unwrap();
        assert_eq!(parse(&result), json!({"a": 1, "b_key": "x"}));
    }

    #[test]
    fn test_keywords_not_quoted() {
        // "flag" and "other" must survive as keywords while the bare
        // trailing token gets quoted
        let input = r#"{"flag": true, "other": null, "b": text}"#;
        let result = repair(input).unwrap();
        assert_eq!(
            parse(&result),
            json!({"flag": true, "other": null, "b": "text"})
        );
    }

    #[test]
    fn test_unterminated_string_value() {
        let input = r#"{"notes": "missing the end}"#;
        let result = repair(input).unwrap();
        assert_eq!(parse(&result), json!({"notes": "missing the end"}));
    }

    #[test]
    fn test_multiword_bare_value() {
        let input = "{\"b\":\nsome text here}";
        let result = repair(input).unwrap();
        assert_eq!(parse(&result), json!({"b": "some text here"}));
    }

    #[test]
    fn test_failure_preserves_both_texts() {
        let input = "{{{{ not json at all ::::";
        let err = repair(input).unwrap_err();
        assert_eq!(err.original, input);
        assert!(!err.attempted.is_empty());
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn test_parse_or_repair_flags_repaired_input() {
        let (value, repaired) = parse_or_repair(r#"{"a": oops}"#).unwrap();
        assert_eq!(value, json!({"a": "oops"}));
        assert!(repaired);

        let (value, repaired) = parse_or_repair(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert!(!repaired);
    }

    #[test]
    fn test_rule_names_are_distinct() {
        let mut names: Vec<_> = REPAIR_RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REPAIR_RULES.len());
    }

    #[test]
    fn test_join_lines_rule() {
        let rule = &REPAIR_RULES[0];
        assert_eq!(rule.name, "join-lines");
        assert_eq!(rule.apply("{\n\"a\"\n:\n1\n}"), "{\"a\":1}");
    }
}
