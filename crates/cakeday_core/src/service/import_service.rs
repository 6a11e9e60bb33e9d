//! Import use-case service.
//!
//! # Responsibility
//! - Read the existing-birthdays snapshot once per import session.
//! - Run validation and deduplication, logging diagnostic counts.
//! - Hand reviewers a started `ReviewWorkflow` and commit through the store.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - A session never re-reads the snapshot; see DESIGN.md on staleness.
//! - Logged events carry counts only, never names, notes or dates.

use crate::date::normalize::{DateNormalizer, NormalizerOptions};
use crate::import::dedup::{DedupResult, DeduplicationEngine};
use crate::import::payload::{parse_extraction_payload, ExtractionError};
use crate::import::policy::{MatchPolicy, PolicyError};
use crate::import::review::{CommitAction, CommitOutcome, ReviewError, ReviewWorkflow};
use crate::import::validate::{validate_with_report, ValidationReport};
use crate::model::extracted::RawExtractedRecord;
use crate::repo::birthday_repo::{BirthdayStore, RepoError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Import pipeline configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImportConfig {
    pub normalizer: NormalizerOptions,
    pub policy: MatchPolicy,
}

/// Session-level import failure.
#[derive(Debug)]
pub enum ImportError {
    /// Extraction output could not be decoded.
    Payload(ExtractionError),
    /// Configuration rejected.
    Policy(PolicyError),
    /// Existing-birthdays snapshot could not be read.
    Snapshot(RepoError),
    /// The review workflow refused to start.
    Review(ReviewError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payload(err) => write!(f, "{err}"),
            Self::Policy(err) => write!(f, "invalid match policy: {err}"),
            Self::Snapshot(err) => write!(f, "reading existing birthdays failed: {err}"),
            Self::Review(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Payload(err) => Some(err),
            Self::Policy(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::Review(err) => Some(err),
        }
    }
}

impl From<ExtractionError> for ImportError {
    fn from(value: ExtractionError) -> Self {
        Self::Payload(value)
    }
}

impl From<ReviewError> for ImportError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

impl From<PolicyError> for ImportError {
    fn from(value: PolicyError) -> Self {
        Self::Policy(value)
    }
}

/// Validation diagnostics plus the dedup partition.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPreview {
    pub validation: ValidationReport,
    pub result: DedupResult,
    /// Number of existing birthdays compared against.
    pub snapshot_size: usize,
}

/// Use-case service wrapping a birthday store.
pub struct ImportService<S: BirthdayStore> {
    store: S,
    normalizer: DateNormalizer,
    engine: DeduplicationEngine,
}

impl<S: BirthdayStore> ImportService<S> {
    /// Creates a service with default normalization and match policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            normalizer: DateNormalizer::default(),
            engine: DeduplicationEngine::default(),
        }
    }

    /// Creates a service with explicit configuration.
    ///
    /// # Errors
    /// - `ImportError::Policy` when thresholds are out of range.
    pub fn with_config(store: S, config: ImportConfig) -> Result<Self, ImportError> {
        config.policy.validate()?;
        Ok(Self {
            store,
            normalizer: DateNormalizer::new(config.normalizer),
            engine: DeduplicationEngine::new(config.policy),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and classifies raw records without writing anything.
    pub fn preview(&self, raw: &[RawExtractedRecord]) -> Result<ImportPreview, ImportError> {
        let started_at = Instant::now();
        let existing = self.store.list_birthdays().map_err(|err| {
            error!(
                "event=import_session module=import status=error error_code=snapshot_failed error={}",
                err
            );
            ImportError::Snapshot(err)
        })?;

        let validation = validate_with_report(raw, &self.normalizer);
        info!(
            "event=import_validate module=import status=ok received={} kept={} missing_name={} missing_date={} unparseable_date={}",
            raw.len(),
            validation.entries.len(),
            validation.dropped_count("missing_name"),
            validation.dropped_count("missing_date"),
            validation.dropped_count("unparseable_date")
        );

        let result = self
            .engine
            .find_duplicates(&validation.entries, &existing);
        info!(
            "event=import_dedup module=import status=ok extracted={} snapshot={} matches={} exact={} new={} duration_ms={}",
            validation.entries.len(),
            existing.len(),
            result.matches.len(),
            result.exact_count(),
            result.new_entries.len(),
            started_at.elapsed().as_millis()
        );

        Ok(ImportPreview {
            validation,
            result,
            snapshot_size: existing.len(),
        })
    }

    /// Decodes an extraction payload and previews it.
    pub fn preview_payload(&self, payload: &str) -> Result<ImportPreview, ImportError> {
        let raw = parse_extraction_payload(payload)?;
        self.preview(&raw)
    }

    /// Runs the pipeline and returns a started review workflow.
    pub fn start_session(&self, raw: &[RawExtractedRecord]) -> Result<ReviewWorkflow, ImportError> {
        let preview = self.preview(raw)?;
        let mut workflow = ReviewWorkflow::with_normalizer(preview.result, self.normalizer.clone());
        let state = workflow.start()?;
        info!(
            "event=import_session module=import status=ok snapshot={} queued={} state={}",
            preview.snapshot_size,
            workflow.remaining(),
            state.as_str()
        );
        Ok(workflow)
    }

    /// Decodes an extraction payload and starts a review session.
    pub fn start_session_from_payload(&self, payload: &str) -> Result<ReviewWorkflow, ImportError> {
        let raw = parse_extraction_payload(payload)?;
        self.start_session(&raw)
    }

    /// Commits the presented item of `workflow` through this service's store.
    pub fn commit(
        &self,
        workflow: &mut ReviewWorkflow,
        action: CommitAction,
    ) -> Result<CommitOutcome, ReviewError> {
        workflow.commit(&self.store, action)
    }
}
