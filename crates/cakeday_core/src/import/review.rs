//! Human review state machine for import candidates.
//!
//! # Responsibility
//! - Present dedup results one item at a time with an editable draft.
//! - Turn each confirmed draft into a single-record store upsert.
//!
//! # Invariants
//! - States: `Idle -> Presenting -> (commit | skip) -> Presenting | Done`.
//! - An item leaves the queue only on successful commit or explicit discard.
//! - A failed commit keeps the item presented and records the error.
//! - Updates target an existing record only when the reviewer asks for it.
//! - Stored relationship/notes are pre-filled into the draft when the
//!   extraction has none, so an update never blanks them unseen.
//! - `commit` borrows the workflow mutably, so one write is in flight.

use crate::date::normalize::{DateNormalizer, DateParseError};
use crate::import::dedup::{DedupResult, MatchAttempt, MatchType};
use crate::model::birthday::{BirthdayId, UpsertRequest};
use crate::model::extracted::ExtractedEntry;
use crate::repo::birthday_repo::{BirthdayStore, RepoError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Classification shown to the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    New,
    ExactMatch,
    PotentialDuplicate,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::ExactMatch => "exact_match",
            Self::PotentialDuplicate => "potential_duplicate",
        }
    }
}

impl From<MatchType> for ReviewStatus {
    fn from(value: MatchType) -> Self {
        match value {
            MatchType::Exact => Self::ExactMatch,
            MatchType::NameOnly => Self::PotentialDuplicate,
        }
    }
}

/// One reviewable candidate.
///
/// `existing_id` is a weak reference: the record is looked up by id at
/// write time, never held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueueItem {
    pub status: ReviewStatus,
    pub extracted: ExtractedEntry,
    pub existing_id: Option<BirthdayId>,
    pub existing_name: Option<String>,
    pub existing_date: Option<String>,
    pub existing_relationship: Option<String>,
    pub existing_notes: Option<String>,
    pub confidence: Option<f64>,
}

impl ReviewQueueItem {
    pub fn from_match(attempt: MatchAttempt) -> Self {
        Self {
            status: attempt.match_type.into(),
            extracted: attempt.extracted,
            existing_id: Some(attempt.existing.id),
            existing_name: Some(attempt.existing.name),
            existing_date: Some(attempt.existing.date),
            existing_relationship: attempt.existing.relationship,
            existing_notes: attempt.existing.notes,
            confidence: Some(attempt.confidence),
        }
    }

    pub fn from_new(entry: ExtractedEntry) -> Self {
        Self {
            status: ReviewStatus::New,
            extracted: entry,
            existing_id: None,
            existing_name: None,
            existing_date: None,
            existing_relationship: None,
            existing_notes: None,
            confidence: None,
        }
    }

    /// Editable form pre-filled from the extracted fields, falling back to
    /// the matched record's relationship and notes.
    pub fn draft(&self) -> ReviewDraft {
        ReviewDraft {
            name: self.extracted.name.clone(),
            date: self.extracted.date.clone(),
            relationship: self
                .extracted
                .relationship
                .clone()
                .or_else(|| self.existing_relationship.clone()),
            notes: self
                .extracted
                .notes
                .clone()
                .or_else(|| self.existing_notes.clone()),
        }
    }
}

/// Reviewer-editable fields. `date` may be free-form until commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub name: String,
    pub date: String,
    pub relationship: Option<String>,
    pub notes: Option<String>,
}

/// What a confirmed item should do to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    /// Insert a new birthday, even when a similar one exists.
    CreateNew,
    /// Overwrite the matched record's fields.
    UpdateExisting,
}

/// What to do with an item the reviewer passes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDisposition {
    /// Move to the back of the queue.
    Requeue,
    /// Drop from this session without touching the store.
    Discard,
}

/// Workflow position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Idle,
    Presenting,
    Done,
}

impl ReviewState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Presenting => "presenting",
            Self::Done => "done",
        }
    }
}

/// Result of a successful commit, for notification rescheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub id: BirthdayId,
    /// `true` for inserts, `false` for updates.
    pub created: bool,
    pub request: UpsertRequest,
    pub state: ReviewState,
}

/// Review transition failure.
#[derive(Debug)]
pub enum ReviewError {
    /// Operation not allowed in the current state.
    InvalidState {
        operation: &'static str,
        state: ReviewState,
    },
    /// Draft name is blank.
    EmptyName,
    /// Draft date does not normalize.
    InvalidDate(DateParseError),
    /// `UpdateExisting` on an item with no matched record.
    MissingExistingId,
    /// The store rejected the write.
    Commit(RepoError),
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while review is {}", state.as_str())
            }
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::MissingExistingId => write!(f, "item has no existing birthday to update"),
            Self::Commit(err) => write!(f, "saving birthday failed: {err}"),
        }
    }
}

impl Error for ReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDate(err) => Some(err),
            Self::Commit(err) => Some(err),
            _ => None,
        }
    }
}

/// Per-item review driver over one dedup result.
#[derive(Debug, Clone)]
pub struct ReviewWorkflow {
    queue: VecDeque<ReviewQueueItem>,
    state: ReviewState,
    draft: Option<ReviewDraft>,
    last_error: Option<String>,
    normalizer: DateNormalizer,
    committed: usize,
    discarded: usize,
}

impl ReviewWorkflow {
    /// Builds the queue: matches first (they need a decision), then new
    /// entries, each bucket in dedup order.
    pub fn new(result: DedupResult) -> Self {
        Self::with_normalizer(result, DateNormalizer::default())
    }

    /// Like [`ReviewWorkflow::new`], normalizing edited dates with
    /// `normalizer`.
    pub fn with_normalizer(result: DedupResult, normalizer: DateNormalizer) -> Self {
        let queue = result
            .matches
            .into_iter()
            .map(ReviewQueueItem::from_match)
            .chain(result.new_entries.into_iter().map(ReviewQueueItem::from_new))
            .collect();
        Self {
            queue,
            state: ReviewState::Idle,
            draft: None,
            last_error: None,
            normalizer,
            committed: 0,
            discarded: 0,
        }
    }

    /// Leaves `Idle`; an empty queue goes straight to `Done`.
    pub fn start(&mut self) -> Result<ReviewState, ReviewError> {
        if self.state != ReviewState::Idle {
            return Err(self.invalid_state("start"));
        }
        self.present_next();
        Ok(self.state)
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ReviewState::Done
    }

    /// Item being presented, if any.
    pub fn current(&self) -> Option<&ReviewQueueItem> {
        match self.state {
            ReviewState::Presenting => self.queue.front(),
            ReviewState::Idle | ReviewState::Done => None,
        }
    }

    /// Reviewer's working copy of the presented item.
    pub fn draft(&self) -> Option<&ReviewDraft> {
        self.draft.as_ref()
    }

    /// Error from the last failed commit of the presented item.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Items not yet committed or discarded, presented one included.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn committed_count(&self) -> usize {
        self.committed
    }

    pub fn discarded_count(&self) -> usize {
        self.discarded
    }

    /// Replaces the draft of the presented item.
    pub fn edit_draft(&mut self, draft: ReviewDraft) -> Result<(), ReviewError> {
        if self.state != ReviewState::Presenting {
            return Err(self.invalid_state("edit"));
        }
        self.draft = Some(draft);
        Ok(())
    }

    /// Confirms the presented item and writes it through `store`.
    ///
    /// On any failure the item stays presented; store failures are also
    /// kept in [`ReviewWorkflow::last_error`].
    pub fn commit<S: BirthdayStore + ?Sized>(
        &mut self,
        store: &S,
        action: CommitAction,
    ) -> Result<CommitOutcome, ReviewError> {
        if self.state != ReviewState::Presenting {
            return Err(self.invalid_state("commit"));
        }

        let request = match self.build_request(action) {
            Ok(request) => request,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        match store.upsert_birthday(&request) {
            Ok(id) => {
                let created = request.id.is_none();
                info!(
                    "event=review_commit module=import status=ok id={} created={} remaining={}",
                    id,
                    created,
                    self.queue.len().saturating_sub(1)
                );
                self.queue.pop_front();
                self.committed += 1;
                self.present_next();
                Ok(CommitOutcome {
                    id,
                    created,
                    request,
                    state: self.state,
                })
            }
            Err(err) => {
                warn!(
                    "event=review_commit module=import status=error error_code={} remaining={}",
                    err.code(),
                    self.queue.len()
                );
                self.last_error = Some(err.to_string());
                Err(ReviewError::Commit(err))
            }
        }
    }

    /// Passes on the presented item without touching the store.
    pub fn skip(&mut self, disposition: SkipDisposition) -> Result<ReviewState, ReviewError> {
        if self.state != ReviewState::Presenting {
            return Err(self.invalid_state("skip"));
        }

        if let Some(item) = self.queue.pop_front() {
            match disposition {
                SkipDisposition::Requeue => self.queue.push_back(item),
                SkipDisposition::Discard => self.discarded += 1,
            }
        }
        info!(
            "event=review_skip module=import status=ok requeue={} remaining={}",
            disposition == SkipDisposition::Requeue,
            self.queue.len()
        );
        self.present_next();
        Ok(self.state)
    }

    fn build_request(&self, action: CommitAction) -> Result<UpsertRequest, ReviewError> {
        let item = self
            .queue
            .front()
            .ok_or_else(|| self.invalid_state("commit"))?;
        let draft = self.draft.clone().unwrap_or_else(|| item.draft());

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ReviewError::EmptyName);
        }
        let date = self
            .normalizer
            .normalize(&draft.date)
            .map_err(ReviewError::InvalidDate)?;
        let id = match action {
            CommitAction::CreateNew => None,
            CommitAction::UpdateExisting => {
                Some(item.existing_id.clone().ok_or(ReviewError::MissingExistingId)?)
            }
        };

        Ok(UpsertRequest::new(
            id,
            name,
            date,
            non_blank(draft.relationship),
            non_blank(draft.notes),
        ))
    }

    fn present_next(&mut self) {
        self.last_error = None;
        match self.queue.front() {
            Some(item) => {
                self.draft = Some(item.draft());
                self.state = ReviewState::Presenting;
            }
            None => {
                self.draft = None;
                self.state = ReviewState::Done;
                info!(
                    "event=review_done module=import status=ok committed={} discarded={}",
                    self.committed, self.discarded
                );
            }
        }
    }

    fn invalid_state(&self, operation: &'static str) -> ReviewError {
        ReviewError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
