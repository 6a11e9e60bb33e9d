//! Fuzzy match thresholds.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MAX_DISTANCE: f64 = 0.3;
pub const DEFAULT_EXACT_MAX_DISTANCE: f64 = 0.1;
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

/// Tunable thresholds for name lookup and match classification.
///
/// Distances are in `[0, 1]`, `0` meaning identical names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Candidates farther than this are not reported at all.
    pub max_distance: f64,
    /// Strictly below this (and same month/day) classifies as `exact`.
    pub exact_max_distance: f64,
    /// Upper bound on ranked candidates returned per query.
    pub max_candidates: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            exact_max_distance: DEFAULT_EXACT_MAX_DISTANCE,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// Rejected policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyError {
    DistanceOutOfRange { field: &'static str, value: f64 },
    ExactAboveCandidate { exact: f64, candidate: f64 },
    ZeroCandidates,
}

impl Display for PolicyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DistanceOutOfRange { field, value } => {
                write!(f, "{field} must be within [0, 1], got {value}")
            }
            Self::ExactAboveCandidate { exact, candidate } => write!(
                f,
                "exact_max_distance ({exact}) must not exceed max_distance ({candidate})"
            ),
            Self::ZeroCandidates => write!(f, "max_candidates must be at least 1"),
        }
    }
}

impl Error for PolicyError {}

impl MatchPolicy {
    /// Checks ranges and threshold ordering.
    pub fn validate(&self) -> Result<(), PolicyError> {
        check_distance("max_distance", self.max_distance)?;
        check_distance("exact_max_distance", self.exact_max_distance)?;
        if self.exact_max_distance > self.max_distance {
            return Err(PolicyError::ExactAboveCandidate {
                exact: self.exact_max_distance,
                candidate: self.max_distance,
            });
        }
        if self.max_candidates == 0 {
            return Err(PolicyError::ZeroCandidates);
        }
        Ok(())
    }
}

fn check_distance(field: &'static str, value: f64) -> Result<(), PolicyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::DistanceOutOfRange { field, value })
    }
}
