//! Birthday record model and single-record write request.
//!
//! # Responsibility
//! - Carry existing records through dedup without interpreting extra fields.
//! - Define the canonical upsert request accepted by a birthday store.
//!
//! # Invariants
//! - `BirthdayRecord::extra` is opaque to the core and passed through as-is.
//! - `UpsertRequest::birth_year` agrees with the year encoded in `date`.

use crate::date::month_day::{birth_year, is_canonical};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier assigned by the birthday store.
pub type BirthdayId = String;

/// Existing birthday as read from the store snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayRecord {
    pub id: BirthdayId,
    pub name: String,
    /// Canonical date, same convention as extracted entries.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Fields the core never looks at (photo refs, reminder settings, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BirthdayRecord {
    /// Creates a record with no optional fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date: date.into(),
            relationship: None,
            notes: None,
            extra: Map::new(),
        }
    }
}

/// Validation failures for store writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BirthdayValidationError {
    EmptyName,
    NonCanonicalDate(String),
    BirthYearMismatch {
        date: String,
        birth_year: Option<i32>,
    },
}

impl Display for BirthdayValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NonCanonicalDate(date) => {
                write!(f, "date `{date}` is not canonical YYYY-MM-DD")
            }
            Self::BirthYearMismatch { date, birth_year } => write!(
                f,
                "birth_year {birth_year:?} does not match date `{date}`"
            ),
        }
    }
}

impl Error for BirthdayValidationError {}

/// Canonical single-record write emitted by the review workflow.
///
/// `id == None` inserts a new record; `Some(id)` updates that record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub id: Option<BirthdayId>,
    pub name: String,
    pub date: String,
    pub relationship: Option<String>,
    pub notes: Option<String>,
    /// Derived from `date`; `None` when the year is unknown.
    pub birth_year: Option<i32>,
}

impl UpsertRequest {
    /// Builds a request and derives `birth_year` from the canonical date.
    pub fn new(
        id: Option<BirthdayId>,
        name: impl Into<String>,
        date: impl Into<String>,
        relationship: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let date = date.into();
        Self {
            id,
            name: name.into(),
            birth_year: birth_year(&date),
            date,
            relationship,
            notes,
        }
    }

    /// Checks the invariants every store write relies on.
    pub fn validate(&self) -> Result<(), BirthdayValidationError> {
        if self.name.trim().is_empty() {
            return Err(BirthdayValidationError::EmptyName);
        }
        if !is_canonical(&self.date) {
            return Err(BirthdayValidationError::NonCanonicalDate(self.date.clone()));
        }
        if self.birth_year != birth_year(&self.date) {
            return Err(BirthdayValidationError::BirthYearMismatch {
                date: self.date.clone(),
                birth_year: self.birth_year,
            });
        }
        Ok(())
    }
}
