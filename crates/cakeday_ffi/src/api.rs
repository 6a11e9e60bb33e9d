//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hold the single in-flight import review session for the UI.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - At most one import session exists; starting a new one replaces it.
//! - Store access opens the database per call; no connection is cached.

use cakeday_core::db::open_db;
use cakeday_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, normalize_date,
    parse_extraction_payload, ping as ping_inner, CommitAction, ImportService, ReviewDraft,
    ReviewQueueItem, ReviewWorkflow, SkipDisposition, SqliteBirthdayRepository,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

const IMPORT_DB_FILE_NAME: &str = "cakeday.sqlite3";
static IMPORT_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static IMPORT_SESSION: Mutex<Option<ReviewWorkflow>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result of normalizing one user-typed date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateNormalizeResponse {
    pub ok: bool,
    /// Canonical `YYYY-MM-DD` (`0000` year when unknown).
    pub date: Option<String>,
    pub message: String,
}

/// Reviewer-edited fields sent back on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDraft {
    pub name: String,
    /// Free-form; normalized at commit.
    pub date: String,
    pub relationship: Option<String>,
    pub notes: Option<String>,
}

/// Presented review item, flattened for Dart.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportQueueItem {
    /// `new|exact_match|potential_duplicate`.
    pub status: String,
    pub draft: ImportDraft,
    pub existing_id: Option<String>,
    pub existing_name: Option<String>,
    pub existing_date: Option<String>,
    pub existing_relationship: Option<String>,
    pub existing_notes: Option<String>,
    pub confidence: Option<f64>,
}

/// Session snapshot returned by every import-session call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSessionResponse {
    /// Whether the requested operation succeeded.
    pub ok: bool,
    /// `none|idle|presenting|done`.
    pub state: String,
    pub current: Option<ImportQueueItem>,
    pub remaining: u32,
    /// Id written by the last successful commit.
    pub committed_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ImportSessionResponse {
    fn from_session(
        ok: bool,
        session: Option<&ReviewWorkflow>,
        committed_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let Some(workflow) = session else {
            return Self {
                ok,
                state: "none".to_string(),
                current: None,
                remaining: 0,
                committed_id,
                message: message.into(),
            };
        };

        Self {
            ok,
            state: workflow.state().as_str().to_string(),
            current: workflow
                .current()
                .map(|item| to_queue_item(item, workflow.draft())),
            remaining: u32::try_from(workflow.remaining()).unwrap_or(u32::MAX),
            committed_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self::from_session(false, None, None, message)
    }
}

/// Normalizes one free-form birthdate.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Never panics; unparseable input returns `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn normalize_birthday_date(raw: String) -> DateNormalizeResponse {
    match normalize_date(&raw) {
        Ok(date) => DateNormalizeResponse {
            ok: true,
            date: Some(date),
            message: String::new(),
        },
        Err(err) => DateNormalizeResponse {
            ok: false,
            date: None,
            message: err.to_string(),
        },
    }
}

/// Starts a review session from raw extraction JSON.
///
/// # FFI contract
/// - Sync call, DB-backed execution (one snapshot read).
/// - Replaces any previous session only on success.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn import_session_start(payload: String) -> ImportSessionResponse {
    let workflow = match start_workflow(&payload) {
        Ok(workflow) => workflow,
        Err(err) => {
            warn!("event=import_session module=ffi status=error error={err}");
            return ImportSessionResponse::failure(format!("import_session_start failed: {err}"));
        }
    };

    let mut session = match lock_session() {
        Ok(session) => session,
        Err(message) => return ImportSessionResponse::failure(message),
    };
    *session = Some(workflow);
    let message = match session.as_ref().and_then(ReviewWorkflow::current) {
        Some(_) => "Review started.",
        None => "Nothing to review.",
    };
    ImportSessionResponse::from_session(true, session.as_ref(), None, message)
}

/// Returns the current session snapshot.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics; `state=none` when no session was started.
#[flutter_rust_bridge::frb(sync)]
pub fn import_session_current() -> ImportSessionResponse {
    match lock_session() {
        Ok(session) => ImportSessionResponse::from_session(true, session.as_ref(), None, ""),
        Err(message) => ImportSessionResponse::failure(message),
    }
}

/// Commits the presented item with the reviewer's draft.
///
/// `update_existing=true` overwrites the matched record; otherwise a new
/// birthday is created.
///
/// # FFI contract
/// - Sync call, DB-backed execution (one upsert).
/// - On failure the item stays presented and `message` carries the error.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn import_session_commit(draft: ImportDraft, update_existing: bool) -> ImportSessionResponse {
    let mut session = match lock_session() {
        Ok(session) => session,
        Err(message) => return ImportSessionResponse::failure(message),
    };
    let Some(workflow) = session.as_mut() else {
        return ImportSessionResponse::failure("import_session_commit failed: no active session");
    };

    let action = if update_existing {
        CommitAction::UpdateExisting
    } else {
        CommitAction::CreateNew
    };
    let result = workflow
        .edit_draft(from_import_draft(draft))
        .map_err(|err| err.to_string())
        .and_then(|()| {
            let conn = open_db(resolve_import_db_path())
                .map_err(|err| format!("import DB open failed: {err}"))?;
            let repo = SqliteBirthdayRepository::new(&conn);
            workflow
                .commit(&repo, action)
                .map_err(|err| err.to_string())
        });

    match result {
        Ok(outcome) => ImportSessionResponse::from_session(
            true,
            Some(&*workflow),
            Some(outcome.id),
            if outcome.created {
                "Birthday created."
            } else {
                "Birthday updated."
            },
        ),
        Err(err) => ImportSessionResponse::from_session(
            false,
            Some(&*workflow),
            None,
            format!("import_session_commit failed: {err}"),
        ),
    }
}

/// Passes on the presented item.
///
/// `requeue=true` moves it to the back of the queue; otherwise it is
/// discarded for this session.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn import_session_skip(requeue: bool) -> ImportSessionResponse {
    let mut session = match lock_session() {
        Ok(session) => session,
        Err(message) => return ImportSessionResponse::failure(message),
    };
    let Some(workflow) = session.as_mut() else {
        return ImportSessionResponse::failure("import_session_skip failed: no active session");
    };

    let disposition = if requeue {
        SkipDisposition::Requeue
    } else {
        SkipDisposition::Discard
    };
    match workflow.skip(disposition) {
        Ok(_) => ImportSessionResponse::from_session(true, Some(&*workflow), None, "Skipped."),
        Err(err) => ImportSessionResponse::from_session(
            false,
            Some(&*workflow),
            None,
            format!("import_session_skip failed: {err}"),
        ),
    }
}

fn start_workflow(payload: &str) -> Result<ReviewWorkflow, String> {
    let raw = parse_extraction_payload(payload).map_err(|err| err.to_string())?;
    let conn = open_db(resolve_import_db_path())
        .map_err(|err| format!("import DB open failed: {err}"))?;
    let service = ImportService::new(SqliteBirthdayRepository::new(&conn));
    service.start_session(&raw).map_err(|err| err.to_string())
}

fn lock_session() -> Result<MutexGuard<'static, Option<ReviewWorkflow>>, String> {
    IMPORT_SESSION
        .lock()
        .map_err(|_| "import session unavailable after an earlier failure".to_string())
}

fn resolve_import_db_path() -> PathBuf {
    IMPORT_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("CAKEDAY_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(IMPORT_DB_FILE_NAME)
        })
        .clone()
}

fn to_queue_item(item: &ReviewQueueItem, draft: Option<&ReviewDraft>) -> ImportQueueItem {
    let draft = draft.cloned().unwrap_or_else(|| item.draft());
    ImportQueueItem {
        status: item.status.as_str().to_string(),
        draft: ImportDraft {
            name: draft.name,
            date: draft.date,
            relationship: draft.relationship,
            notes: draft.notes,
        },
        existing_id: item.existing_id.clone(),
        existing_name: item.existing_name.clone(),
        existing_date: item.existing_date.clone(),
        existing_relationship: item.existing_relationship.clone(),
        existing_notes: item.existing_notes.clone(),
        confidence: item.confidence,
    }
}

fn from_import_draft(draft: ImportDraft) -> ReviewDraft {
    ReviewDraft {
        name: draft.name,
        date: draft.date,
        relationship: draft.relationship,
        notes: draft.notes,
    }
}
