//! Core domain logic for Cakeday birthday imports.
//! This crate is the single source of truth for import invariants.

pub mod date;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use date::month_day::compare_month_day;
pub use date::normalize::{
    normalize_date, DateNormalizer, DateParseError, NormalizerOptions, SlashDateOrder,
};
pub use import::dedup::{DedupResult, DeduplicationEngine, MatchAttempt, MatchType};
pub use import::fuzzy::{FuzzyMatcher, NameDistance, TokenSimilarity};
pub use import::payload::{parse_extraction_payload, ExtractionError};
pub use import::policy::{MatchPolicy, PolicyError};
pub use import::review::{
    CommitAction, CommitOutcome, ReviewDraft, ReviewError, ReviewQueueItem, ReviewState,
    ReviewStatus, ReviewWorkflow, SkipDisposition,
};
pub use import::validate::{validate, validate_with_report, ValidationReport};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::birthday::{BirthdayId, BirthdayRecord, BirthdayValidationError, UpsertRequest};
pub use model::extracted::{ExtractedEntry, RawExtractedRecord};
pub use repo::birthday_repo::{BirthdayStore, RepoError, RepoResult, SqliteBirthdayRepository};
pub use service::import_service::{ImportConfig, ImportError, ImportPreview, ImportService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
