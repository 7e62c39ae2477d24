//! Schema detection for parsed insight documents.
//!
//! The corpus carries a closed set of ad-hoc document shapes. Detection is
//! ordered, first-match-wins, and total: every JSON value classifies as
//! exactly one [`SchemaKind`], with unrecognized shapes falling through to
//! [`SchemaKind::Unknown`] instead of erroring.

use serde_json::Value;

/// Category names that mark a numeric-keyed value holding category arrays
/// directly, without a `categories` wrapper.
pub const DIRECT_CATEGORY_KEYS: &[&str] =
    &["insight", "reflection", "contemplation", "manifestation"];

/// Recognized document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Top-level `categories` mapping of category name to insight list.
    CategoriesWrapper,
    /// Like [`Self::CategoriesWrapper`], plus a `number` field and persona
    /// metadata.
    PersonaWithCategories,
    /// Top-level keys are numeric strings, values are category mappings.
    NumberKeyed,
    /// Numeric-keyed values nest a further `categories` key.
    NumberKeyedWithCategories,
    /// Numeric-keyed values hold category arrays directly.
    NumberKeyedDirectCategories,
    /// Top-level keys are categories mapping directly to arrays.
    DirectCategories,
    /// Top-level `behavioral_insights` array of canonical records.
    BehavioralInsights,
    /// Published document shape (`system` / `tier` fields).
    FirebaseDocument,
    /// Persona export keyed by `primary_persona`.
    PersonaPrimary,
    /// The document itself is an array.
    Array,
    /// Catch-all for unrecognized shapes.
    Unknown,
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchemaKind::CategoriesWrapper => "categories_wrapper",
            SchemaKind::PersonaWithCategories => "persona_with_categories",
            SchemaKind::NumberKeyed => "number_keyed",
            SchemaKind::NumberKeyedWithCategories => "number_keyed_with_categories",
            SchemaKind::NumberKeyedDirectCategories => "number_keyed_direct_categories",
            SchemaKind::DirectCategories => "direct_categories",
            SchemaKind::BehavioralInsights => "behavioral_insights",
            SchemaKind::FirebaseDocument => "firebase_document",
            SchemaKind::PersonaPrimary => "persona_primary",
            SchemaKind::Array => "array",
            SchemaKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Classifies a parsed document into exactly one [`SchemaKind`].
pub fn detect(document: &Value) -> SchemaKind {
    if let Value::Object(map) = document {
        if map.contains_key("categories") {
            return if map.contains_key("number") {
                SchemaKind::PersonaWithCategories
            } else {
                SchemaKind::CategoriesWrapper
            };
        }

        // First numeric-keyed value decides the number_keyed sub-shape
        if let Some((_, first)) = map.iter().find(|(key, _)| is_numeric_key(key.as_str())) {
            if let Value::Object(inner) = first {
                if inner.contains_key("categories") {
                    return SchemaKind::NumberKeyedWithCategories;
                }
                if DIRECT_CATEGORY_KEYS.iter().any(|key| inner.contains_key(*key)) {
                    return SchemaKind::NumberKeyedDirectCategories;
                }
            }
            return SchemaKind::NumberKeyed;
        }

        if map.contains_key("primary_persona") {
            return SchemaKind::PersonaPrimary;
        }

        if !map.is_empty() && map.values().all(Value::is_array) {
            return SchemaKind::DirectCategories;
        }

        if map.contains_key("behavioral_insights") {
            return SchemaKind::BehavioralInsights;
        }

        if map.contains_key("system") || map.contains_key("tier") {
            return SchemaKind::FirebaseDocument;
        }

        return SchemaKind::Unknown;
    }

    if document.is_array() {
        return SchemaKind::Array;
    }

    SchemaKind::Unknown
}

/// A key is numeric when it is a non-empty run of ASCII digits.
pub(crate) fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_categories_wrapper() {
        let doc = json!({"categories": {"stress": []}});
        assert_eq!(detect(&doc), SchemaKind::CategoriesWrapper);
    }

    #[test]
    fn test_detect_persona_with_categories() {
        let doc = json!({"number": 7, "persona": "Seeker", "categories": {}});
        assert_eq!(detect(&doc), SchemaKind::PersonaWithCategories);
    }

    #[test]
    fn test_categories_wins_over_numeric_keys() {
        let doc = json!({"categories": {}, "3": {}});
        assert_eq!(detect(&doc), SchemaKind::CategoriesWrapper);
    }

    #[test]
    fn test_detect_number_keyed() {
        let doc = json!({"5": {"summary": "x"}});
        assert_eq!(detect(&doc), SchemaKind::NumberKeyed);
    }

    #[test]
    fn test_detect_number_keyed_with_categories() {
        let doc = json!({"5": {"categories": {"work": []}}});
        assert_eq!(detect(&doc), SchemaKind::NumberKeyedWithCategories);
    }

    #[test]
    fn test_detect_number_keyed_direct_categories() {
        let doc = json!({"1": {"insight": ["text"], "reflection": ["more"]}});
        assert_eq!(detect(&doc), SchemaKind::NumberKeyedDirectCategories);
    }

    #[test]
    fn test_detect_persona_primary() {
        let doc = json!({"primary_persona": {"name": "Sage"}});
        assert_eq!(detect(&doc), SchemaKind::PersonaPrimary);
    }

    #[test]
    fn test_detect_direct_categories() {
        let doc = json!({"stress": [], "work": []});
        assert_eq!(detect(&doc), SchemaKind::DirectCategories);
    }

    #[test]
    fn test_detect_behavioral_insights() {
        let doc = json!({"number": 4, "behavioral_insights": []});
        assert_eq!(detect(&doc), SchemaKind::BehavioralInsights);
    }

    #[test]
    fn test_detect_firebase_document() {
        let doc = json!({"system": "numerology", "content": {}});
        assert_eq!(detect(&doc), SchemaKind::FirebaseDocument);
    }

    #[test]
    fn test_detect_array() {
        let doc = json!([{"text": "x"}]);
        assert_eq!(detect(&doc), SchemaKind::Array);
    }

    #[test]
    fn test_detect_is_total() {
        // Every JSON value classifies without panicking
        let cases = vec![
            json!(null),
            json!(true),
            json!(42),
            json!("just a string"),
            json!({}),
            json!([]),
            json!({"mystery": {"nested": 1}}),
        ];
        for doc in cases {
            let _ = detect(&doc);
        }
        assert_eq!(detect(&json!(null)), SchemaKind::Unknown);
        assert_eq!(detect(&json!({})), SchemaKind::Unknown);
        assert_eq!(detect(&json!([])), SchemaKind::Array);
    }

    #[test]
    fn test_numeric_key_recognition() {
        assert!(is_numeric_key("5"));
        assert!(is_numeric_key("44"));
        assert!(!is_numeric_key(""));
        assert!(!is_numeric_key("5a"));
        assert!(!is_numeric_key("-1"));
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(SchemaKind::CategoriesWrapper.to_string(), "categories_wrapper");
        assert_eq!(SchemaKind::Unknown.to_string(), "unknown");
    }
}
