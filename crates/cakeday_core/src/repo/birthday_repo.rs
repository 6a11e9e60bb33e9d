//! Birthday store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the narrow store interface the import core depends on.
//! - Persist birthday records one at a time.
//!
//! # Invariants
//! - Write paths call `UpsertRequest::validate()` before SQL mutations.
//! - Updates never touch `extra_json`; unknown fields survive imports.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `InvalidData` messages name the row id, never its name or date.

use crate::date::month_day::is_canonical;
use crate::db::DbError;
use crate::model::birthday::{BirthdayId, BirthdayRecord, BirthdayValidationError, UpsertRequest};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BIRTHDAY_SELECT_SQL: &str = "SELECT
    id,
    name,
    date,
    relationship,
    notes,
    extra_json
FROM birthdays";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for birthday persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(BirthdayValidationError),
    Db(DbError),
    NotFound(BirthdayId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "birthday not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted birthday data: {message}"),
        }
    }
}

impl RepoError {
    /// Stable label for log lines; never carries record contents.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Db(_) => "db",
            Self::NotFound(_) => "not_found",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<BirthdayValidationError> for RepoError {
    fn from(value: BirthdayValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store interface consumed by the import pipeline.
///
/// The snapshot is read once per import session; writes are always one
/// record per call.
pub trait BirthdayStore {
    /// Returns every stored birthday.
    fn list_birthdays(&self) -> RepoResult<Vec<BirthdayRecord>>;

    /// Inserts (`request.id == None`) or updates one record.
    ///
    /// Returns the assigned id on insert and the target id on update.
    fn upsert_birthday(&self, request: &UpsertRequest) -> RepoResult<BirthdayId>;
}

/// SQLite-backed birthday repository.
pub struct SqliteBirthdayRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBirthdayRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts a full record, keeping its id and extra fields.
    ///
    /// Used when records arrive from another source with identity attached.
    pub fn create_birthday(&self, record: &BirthdayRecord) -> RepoResult<BirthdayId> {
        if record.id.trim().is_empty() {
            return Err(RepoError::InvalidData("birthday id must not be empty".to_string()));
        }
        let request = UpsertRequest::new(
            Some(record.id.clone()),
            record.name.clone(),
            record.date.clone(),
            record.relationship.clone(),
            record.notes.clone(),
        );
        request.validate()?;
        let extra_json = serde_json::to_string(&record.extra)
            .map_err(|err| RepoError::InvalidData(format!("extra fields not serializable: {err}")))?;

        self.conn.execute(
            "INSERT INTO birthdays (
                id,
                name,
                date,
                relationship,
                notes,
                birth_year,
                extra_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.as_str(),
                request.name.trim(),
                request.date.as_str(),
                request.relationship.as_deref(),
                request.notes.as_deref(),
                request.birth_year,
                extra_json,
            ],
        )?;

        Ok(record.id.clone())
    }

    /// Gets one birthday by id.
    pub fn get_birthday(&self, id: &str) -> RepoResult<Option<BirthdayRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BIRTHDAY_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_birthday_row(row)))
            .optional()?;
        row.transpose()
    }

    fn insert(&self, request: &UpsertRequest) -> RepoResult<BirthdayId> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO birthdays (
                id,
                name,
                date,
                relationship,
                notes,
                birth_year
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.as_str(),
                request.name.trim(),
                request.date.as_str(),
                request.relationship.as_deref(),
                request.notes.as_deref(),
                request.birth_year,
            ],
        )?;
        Ok(id)
    }

    fn update(&self, id: &str, request: &UpsertRequest) -> RepoResult<BirthdayId> {
        let changed = self.conn.execute(
            "UPDATE birthdays
             SET
                name = ?1,
                date = ?2,
                relationship = ?3,
                notes = ?4,
                birth_year = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                request.name.trim(),
                request.date.as_str(),
                request.relationship.as_deref(),
                request.notes.as_deref(),
                request.birth_year,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(id.to_string())
    }
}

impl BirthdayStore for SqliteBirthdayRepository<'_> {
    fn list_birthdays(&self) -> RepoResult<Vec<BirthdayRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BIRTHDAY_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_birthday_row(row)?);
        }

        Ok(records)
    }

    fn upsert_birthday(&self, request: &UpsertRequest) -> RepoResult<BirthdayId> {
        request.validate()?;
        match request.id.as_deref() {
            Some(id) => self.update(id, request),
            None => self.insert(request),
        }
    }
}

fn parse_birthday_row(row: &Row<'_>) -> RepoResult<BirthdayRecord> {
    let id: String = row.get("id")?;
    let date: String = row.get("date")?;
    if !is_canonical(&date) {
        return Err(RepoError::InvalidData(format!(
            "invalid date in birthdays.date for {id}"
        )));
    }

    let extra_text: String = row.get("extra_json")?;
    let extra = match serde_json::from_str::<Value>(&extra_text) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            return Err(RepoError::InvalidData(format!(
                "invalid extra_json in birthdays.extra_json for {id}"
            )));
        }
    };

    Ok(BirthdayRecord {
        id,
        name: row.get("name")?,
        date,
        relationship: row.get("relationship")?,
        notes: row.get("notes")?,
        extra,
    })
}
