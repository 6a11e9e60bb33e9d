//! Extraction records before and after validation.
//!
//! # Responsibility
//! - Accept loosely-typed AI/OCR output without failing on shape noise.
//! - Define the closed `ExtractedEntry` consumed by deduplication.
//!
//! # Invariants
//! - `ExtractedEntry::name` is trimmed and non-empty.
//! - `ExtractedEntry::date` is canonical; raw dates never reach dedup.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const NAME_KEYS: [&str; 3] = ["name", "full_name", "person"];
const DATE_KEYS: [&str; 4] = ["date", "birthday", "birthdate", "dob"];
const NOTES_KEYS: [&str; 2] = ["notes", "note"];
const RELATIONSHIP_KEYS: [&str; 2] = ["relationship", "relation"];

/// One record as returned by an extraction collaborator.
///
/// Every field is optional and untyped: models return numbers for dates,
/// `null` for unknown notes, or rename keys between prompts. Any JSON object
/// deserializes; when several synonyms are present the first non-null one in
/// key order wins (`name` before `full_name`, `date` before `birthday`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawExtractedRecord {
    pub name: Option<Value>,
    pub date: Option<Value>,
    pub notes: Option<Value>,
    pub relationship: Option<Value>,
    pub confidence: Option<Value>,
}

impl<'de> Deserialize<'de> for RawExtractedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_object)
    }
}

impl RawExtractedRecord {
    /// Reads one extraction object, resolving key synonyms.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        Self {
            name: take_first(&mut object, &NAME_KEYS),
            date: take_first(&mut object, &DATE_KEYS),
            notes: take_first(&mut object, &NOTES_KEYS),
            relationship: take_first(&mut object, &RELATIONSHIP_KEYS),
            confidence: take_first(&mut object, &["confidence"]),
        }
    }

    /// Convenience constructor for string-only records.
    pub fn from_strings(name: &str, date: &str) -> Self {
        Self {
            name: Some(Value::String(name.to_string())),
            date: Some(Value::String(date.to_string())),
            ..Self::default()
        }
    }

    pub fn name_text(&self) -> Option<String> {
        field_text(self.name.as_ref())
    }

    pub fn date_text(&self) -> Option<String> {
        field_text(self.date.as_ref())
    }

    pub fn notes_text(&self) -> Option<String> {
        field_text(self.notes.as_ref())
    }

    pub fn relationship_text(&self) -> Option<String> {
        field_text(self.relationship.as_ref())
    }

    pub fn confidence_text(&self) -> Option<String> {
        field_text(self.confidence.as_ref()).map(|value| value.to_ascii_lowercase())
    }
}

/// Validated extraction entry with a canonical date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntry {
    pub name: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Informational only (`high|medium|low`); matching ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
}

impl ExtractedEntry {
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            notes: None,
            relationship: None,
            confidence: None,
        }
    }
}

fn take_first(object: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| object.remove(*key))
        .find(|value| !value.is_null())
}

/// Reads a scalar JSON value as trimmed, non-empty text.
fn field_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
