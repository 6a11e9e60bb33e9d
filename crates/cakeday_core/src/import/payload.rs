//! Decoding of raw extraction payloads.
//!
//! # Responsibility
//! - Accept the JSON shapes extraction models actually return.
//! - Produce `RawExtractedRecord` values without enforcing field semantics.
//!
//! # Invariants
//! - Per-record shape noise never fails the whole payload; only JSON that
//!   is not a record list does.
//! - Every object in the list yields a record, so validation sees and
//!   counts it.

use crate::model::extracted::RawExtractedRecord;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const WRAPPER_KEYS: [&str; 3] = ["birthdays", "entries", "records"];

/// Payload-level decoding failure.
#[derive(Debug)]
pub enum ExtractionError {
    /// Text is not JSON.
    Json(serde_json::Error),
    /// JSON is valid but holds no record list.
    UnexpectedShape(&'static str),
}

impl Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "extraction payload is not valid JSON: {err}"),
            Self::UnexpectedShape(found) => {
                write!(f, "extraction payload has no record list (found {found})")
            }
        }
    }
}

impl Error for ExtractionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnexpectedShape(_) => None,
        }
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Parses extraction output into raw records.
///
/// Accepted shapes:
/// - a bare JSON array of record objects
/// - an object with a `birthdays` (or `entries`/`records`) array
/// - either of the above inside a markdown code fence
///
/// Array items that are not objects are skipped.
pub fn parse_extraction_payload(text: &str) -> Result<Vec<RawExtractedRecord>, ExtractionError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            let list = WRAPPER_KEYS
                .iter()
                .find_map(|key| match object.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                });
            list.ok_or(ExtractionError::UnexpectedShape("object"))?
        }
        Value::Null => return Err(ExtractionError::UnexpectedShape("null")),
        Value::Bool(_) => return Err(ExtractionError::UnexpectedShape("boolean")),
        Value::Number(_) => return Err(ExtractionError::UnexpectedShape("number")),
        Value::String(_) => return Err(ExtractionError::UnexpectedShape("string")),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(RawExtractedRecord::from_object(object)),
            _ => None,
        })
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::{parse_extraction_payload, strip_code_fence, ExtractionError};

    #[test]
    fn parses_bare_array_and_skips_non_objects() {
        let records =
            parse_extraction_payload(r#"[{"name":"Ada","date":"1815-12-10"}, 7, "x"]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name_text().as_deref(), Some("Ada"));
    }

    #[test]
    fn parses_fenced_wrapper_object() {
        let text = "```json\n{\"birthdays\": [{\"name\": \"Ada\", \"date\": \"10 Dec\"}]}\n```";
        let records = parse_extraction_payload(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_text().as_deref(), Some("10 Dec"));
    }

    #[test]
    fn objects_with_duplicate_synonyms_are_kept() {
        let records = parse_extraction_payload(
            r#"[
                {"name": "Ada", "full_name": "Ada Lovelace", "date": "10 Dec"},
                {"name": "Grace", "date": "9 Dec", "birthday": "1906-12-09"},
                {"full_name": "Alan Turing", "dob": "23 June 1912"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name_text().as_deref(), Some("Ada"));
        assert_eq!(records[1].date_text().as_deref(), Some("9 Dec"));
        assert_eq!(records[2].name_text().as_deref(), Some("Alan Turing"));
    }

    #[test]
    fn rejects_objects_without_record_list() {
        let err = parse_extraction_payload(r#"{"result": "none"}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::UnexpectedShape("object")));
        assert!(matches!(
            parse_extraction_payload("not json").unwrap_err(),
            ExtractionError::Json(_)
        ));
    }

    #[test]
    fn strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  [1] "), "[1]");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
    }
}
