//! Topic key inference from corpus filename conventions.
//!
//! Source files embed the topic they describe in a fixed set of filename
//! patterns (`SU<n>.md`, `<Persona>Insights_Number_<n>.json`,
//! `NumberMessages_Complete_<n>.json`, `<Sign>_archetypal.json`). When no
//! pattern matches, inference yields `None` and the ambiguity is surfaced
//! in the batch report rather than resolved by guessing.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Single-digit topic numbers plus the master numbers.
pub const MASTER_NUMBERS: &[u8] = &[11, 22, 33, 44];

const ZODIAC_SIGNS: &[&str] = &[
    "aries",
    "taurus",
    "gemini",
    "cancer",
    "leo",
    "virgo",
    "libra",
    "scorpio",
    "sagittarius",
    "capricorn",
    "aquarius",
    "pisces",
];

const PLANETS: &[&str] = &[
    "sun", "moon", "mercury", "venus", "mars", "jupiter", "saturn", "uranus", "neptune", "pluto",
];

/// The numerology/astrology identifier an insight is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKey {
    /// A numerology number: 1-9 or one of the master numbers.
    Number(u8),
    /// A planet name.
    Planet(String),
    /// A zodiac sign.
    Sign(String),
}

impl TopicKey {
    /// Validates and wraps a topic number. Numbers outside 1-9 and the
    /// master numbers are not valid topics.
    pub fn number(n: u64) -> Option<TopicKey> {
        let small = u8::try_from(n).ok()?;
        if (1..=9).contains(&small) || MASTER_NUMBERS.contains(&small) {
            Some(TopicKey::Number(small))
        } else {
            None
        }
    }

    /// Reads the topic from a parsed document's own `number` field, which
    /// wins over any filename-derived topic.
    pub fn from_document(document: &Value) -> Option<TopicKey> {
        match document.get("number")? {
            Value::Number(n) => TopicKey::number(n.as_u64()?),
            Value::String(s) => TopicKey::number(s.trim().parse().ok()?),
            _ => None,
        }
    }

    /// The numeric value when this topic is a number.
    pub fn as_number(&self) -> Option<u8> {
        match self {
            TopicKey::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKey::Number(n) => write!(f, "{}", n),
            TopicKey::Planet(name) | TopicKey::Sign(name) => write!(f, "{}", name),
        }
    }
}

static RE_SU: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^SU(\d+)$").unwrap());

static RE_INSIGHTS_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Insights_Number_(\d+)$").unwrap());

static RE_NUMBER_MESSAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^NumberMessages_Complete_(\d+)$").unwrap());

static RE_ARCHETYPAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)_archetypal$").unwrap());

/// Infers the topic key from a source file path.
pub fn infer_from_path(path: &Path) -> Option<TopicKey> {
    let stem = path.file_stem()?.to_str()?;

    for pattern in [&*RE_SU, &*RE_INSIGHTS_NUMBER, &*RE_NUMBER_MESSAGES] {
        if let Some(caps) = pattern.captures(stem) {
            return TopicKey::number(caps[1].parse().ok()?);
        }
    }

    if let Some(caps) = RE_ARCHETYPAL.captures(stem) {
        let name = caps[1].to_lowercase();
        if ZODIAC_SIGNS.contains(&name.as_str()) {
            return Some(TopicKey::Sign(caps[1].to_string()));
        }
        if PLANETS.contains(&name.as_str()) {
            return Some(TopicKey::Planet(caps[1].to_string()));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_su_pattern() {
        let topic = infer_from_path(Path::new("content/SU7.md"));
        assert_eq!(topic, Some(TopicKey::Number(7)));
    }

    #[test]
    fn test_persona_insights_pattern() {
        let topic = infer_from_path(Path::new("SeekerInsights_Number_11.json"));
        assert_eq!(topic, Some(TopicKey::Number(11)));
    }

    #[test]
    fn test_number_messages_pattern() {
        let topic = infer_from_path(Path::new("NumberMessages_Complete_3.json"));
        assert_eq!(topic, Some(TopicKey::Number(3)));
    }

    #[test]
    fn test_archetypal_sign_pattern() {
        let topic = infer_from_path(Path::new("Scorpio_archetypal.json"));
        assert_eq!(topic, Some(TopicKey::Sign("Scorpio".to_string())));
    }

    #[test]
    fn test_archetypal_planet_pattern() {
        let topic = infer_from_path(Path::new("Mars_archetypal.json"));
        assert_eq!(topic, Some(TopicKey::Planet("Mars".to_string())));
    }

    #[test]
    fn test_unrecognized_filename_is_ambiguous() {
        assert_eq!(infer_from_path(Path::new("random_notes.json")), None);
        assert_eq!(infer_from_path(Path::new("Atlantis_archetypal.json")), None);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        // 10 is not a valid topic number; 44 is a master number
        assert_eq!(infer_from_path(Path::new("SU10.md")), None);
        assert_eq!(infer_from_path(Path::new("SU44.md")), Some(TopicKey::Number(44)));
        assert_eq!(infer_from_path(Path::new("SU0.md")), None);
    }

    #[test]
    fn test_from_document_number_field() {
        assert_eq!(
            TopicKey::from_document(&json!({"number": 5})),
            Some(TopicKey::Number(5))
        );
        assert_eq!(
            TopicKey::from_document(&json!({"number": "22"})),
            Some(TopicKey::Number(22))
        );
        assert_eq!(TopicKey::from_document(&json!({"number": 10})), None);
        assert_eq!(TopicKey::from_document(&json!({"title": "x"})), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TopicKey::Number(9).to_string(), "9");
        assert_eq!(TopicKey::Sign("Leo".into()).to_string(), "Leo");
    }
}
