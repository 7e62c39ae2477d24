//! Insight extraction and normalization.
//!
//! Walks a detected schema's structure and flattens it into the canonical
//! [`InsightRecord`] list. Dispatch happens in a single exhaustive match
//! on [`SchemaKind`]; adding a new schema variant is a one-place change.
//!
//! Extraction order is the source file's insertion order of categories,
//! then source array order, so repeated runs against unchanged input
//! produce identical output.

use crate::detect::{is_numeric_key, SchemaKind};
use crate::model::{InsightRecord, DEFAULT_INTENSITY};
use serde_json::{Map, Value};

/// Built-in category synonym table. Unmatched names substring-match
/// against the keys; the total fallback is `general`.
const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("relationships", "relationshipDynamics"),
    ("love", "relationshipDynamics"),
    ("work", "workStyle"),
    ("career", "workStyle"),
    ("stress", "stressResponse"),
    ("anxiety", "stressResponse"),
    ("decisions", "decisionMaking"),
    ("communication", "communicationStyle"),
    ("growth", "personalGrowth"),
    ("spirituality", "spiritualAlignment"),
    ("money", "abundanceMindset"),
    ("health", "wellnessPatterns"),
    ("creativity", "creativeExpression"),
    ("leadership", "leadershipStyle"),
    ("emotions", "emotionalLandscape"),
];

/// Maps raw source category names onto the canonical category set.
///
/// The table is immutable configuration; alternate tables can be supplied
/// for new content domains without touching extraction logic.
#[derive(Debug, Clone)]
pub struct CategoryMapper {
    table: Vec<(String, String)>,
}

impl Default for CategoryMapper {
    fn default() -> Self {
        Self {
            table: CATEGORY_SYNONYMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl CategoryMapper {
    /// Creates a mapper over a custom synonym table. Keys are matched
    /// case-insensitively.
    pub fn new(table: Vec<(String, String)>) -> Self {
        Self {
            table: table
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    /// Resolves a raw category name: exact match first, then substring
    /// match in either direction, then `general`.
    pub fn map(&self, raw: &str) -> String {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return "general".to_string();
        }
        for (key, canonical) in &self.table {
            if *key == needle {
                return canonical.clone();
            }
        }
        for (key, canonical) in &self.table {
            if needle.contains(key.as_str()) || key.contains(needle.as_str()) {
                return canonical.clone();
            }
        }
        "general".to_string()
    }
}

/// Options controlling extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// A record's trimmed text must be strictly longer than this.
    pub min_text_chars: usize,
    /// Hard cap on records per source file; the first N are kept.
    pub max_records: usize,
    /// Intensity assigned when the source carries none.
    pub default_intensity: f64,
    /// Category synonym table.
    pub mapper: CategoryMapper,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_text_chars: 10,
            max_records: 144,
            default_intensity: DEFAULT_INTENSITY,
            mapper: CategoryMapper::default(),
        }
    }
}

impl ExtractOptions {
    /// Sets the per-file record cap.
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Sets the minimum text length (exclusive).
    pub fn with_min_text_chars(mut self, min: usize) -> Self {
        self.min_text_chars = min;
        self
    }

    /// Supplies an alternate category table.
    pub fn with_mapper(mut self, mapper: CategoryMapper) -> Self {
        self.mapper = mapper;
        self
    }
}

/// Extracts the canonical record list from a detected document.
///
/// `fallback_topic` applies when the document carries no topic of its
/// own (no `number` field and no numeric top-level keys).
pub fn extract(
    document: &Value,
    kind: SchemaKind,
    fallback_topic: Option<&str>,
    options: &ExtractOptions,
) -> Vec<InsightRecord> {
    let mut out = Vec::new();
    let doc_topic = document_number(document).or_else(|| fallback_topic.map(String::from));
    let topic = doc_topic.as_deref();

    match kind {
        SchemaKind::CategoriesWrapper | SchemaKind::PersonaWithCategories => {
            if let Some(categories) = document.get("categories").and_then(Value::as_object) {
                collect_categories(categories, topic, options, &mut out);
            }
        }
        SchemaKind::NumberKeyedWithCategories => {
            for (key, value) in numeric_entries(document) {
                if let Some(categories) = value.get("categories").and_then(Value::as_object) {
                    collect_categories(categories, Some(key), options, &mut out);
                }
            }
        }
        SchemaKind::NumberKeyed | SchemaKind::NumberKeyedDirectCategories => {
            for (key, value) in numeric_entries(document) {
                if let Some(map) = value.as_object() {
                    collect_categories(map, Some(key), options, &mut out);
                }
            }
        }
        SchemaKind::DirectCategories => {
            if let Some(map) = document.as_object() {
                collect_categories(map, topic, options, &mut out);
            }
        }
        SchemaKind::BehavioralInsights => {
            if let Some(items) = document
                .get("behavioral_insights")
                .and_then(Value::as_array)
            {
                for item in items {
                    push_record(item, None, topic, options, &mut out);
                }
            }
        }
        SchemaKind::FirebaseDocument
        | SchemaKind::PersonaPrimary
        | SchemaKind::Array
        | SchemaKind::Unknown => {
            flatten(document, topic, options, &mut out);
        }
    }

    out.truncate(options.max_records);
    out
}

/// The document's own `number` field, as a topic string.
fn document_number(document: &Value) -> Option<String> {
    match document.get("number")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn numeric_entries(document: &Value) -> impl Iterator<Item = (&str, &Value)> {
    document
        .as_object()
        .into_iter()
        .flat_map(|map| map.iter())
        .filter(|(key, _)| is_numeric_key(key.as_str()))
        .map(|(key, value)| (key.as_str(), value))
}

/// Collects every category's insight list in source order.
fn collect_categories(
    categories: &Map<String, Value>,
    topic: Option<&str>,
    options: &ExtractOptions,
    out: &mut Vec<InsightRecord>,
) {
    for (category, value) in categories {
        if let Some(items) = value.as_array() {
            for item in items {
                push_record(item, Some(category), topic, options, out);
            }
        }
    }
}

/// Normalizes one insight item (a plain string or an object carrying a
/// `text`/`insight` field) into a record. Items missing a text key are
/// skipped; this is not a batch failure.
fn push_record(
    item: &Value,
    category: Option<&str>,
    topic: Option<&str>,
    options: &ExtractOptions,
    out: &mut Vec<InsightRecord>,
) {
    let (text, fields) = match item {
        Value::String(s) => (s.as_str(), None),
        Value::Object(map) => {
            let text = map
                .get("text")
                .and_then(Value::as_str)
                .or_else(|| map.get("insight").and_then(Value::as_str));
            match text {
                Some(text) => (text, Some(map)),
                None => return,
            }
        }
        _ => return,
    };

    let text = text.trim();
    if text.chars().count() <= options.min_text_chars {
        return;
    }

    let raw_category = category.map(str::to_string).or_else(|| {
        fields.and_then(|map| {
            map.get("category")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
    });
    let category = match raw_category {
        Some(name) => options.mapper.map(&name),
        None => "general".to_string(),
    };

    let intensity = fields
        .and_then(|map| map.get("intensity"))
        .and_then(Value::as_f64)
        .unwrap_or(options.default_intensity);

    out.push(InsightRecord {
        text: text.to_string(),
        category,
        topic_key: topic.unwrap_or_default().to_string(),
        intensity,
        triggers: string_list(fields, "triggers"),
        supports: string_list(fields, "supports"),
        challenges: string_list(fields, "challenges"),
        source_file: None,
        source_index: out.len(),
    });
}

fn string_list(fields: Option<&Map<String, Value>>, key: &str) -> Vec<String> {
    fields
        .and_then(|map| map.get(key))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Best-effort flatten for unrecognized shapes: collect every string
/// found under an insight-bearing key (`text`, `insight`), anywhere in
/// the tree.
fn flatten(value: &Value, topic: Option<&str>, options: &ExtractOptions, out: &mut Vec<InsightRecord>) {
    match value {
        Value::Object(map) => {
            let has_text = map.get("text").is_some_and(Value::is_string)
                || map.get("insight").is_some_and(Value::is_string);
            if has_text {
                push_record(value, None, topic, options, out);
                return;
            }
            for (key, child) in map {
                if matches!(key.as_str(), "text" | "insight") {
                    if let Some(items) = child.as_array() {
                        for item in items {
                            push_record(item, None, topic, options, out);
                        }
                        continue;
                    }
                }
                flatten(child, topic, options, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten(item, topic, options, out);
            }
        }
        _ => {}
    }
}
