//! Duplicate classification of extracted entries.
//!
//! # Responsibility
//! - Partition validated entries into `matches` and `new_entries`.
//! - Classify each match as `exact` or `name_only`.
//!
//! # Invariants
//! - Every entry with a non-empty name lands in exactly one bucket.
//! - Only the top-ranked candidate is reported per entry.
//! - The engine never writes: it classifies, a human decides.

use crate::date::month_day::compare_month_day;
use crate::import::fuzzy::{FuzzyMatcher, NameDistance, TokenSimilarity};
use crate::import::policy::MatchPolicy;
use crate::model::birthday::BirthdayRecord;
use crate::model::extracted::ExtractedEntry;
use serde::{Deserialize, Serialize};

/// How confidently an extracted entry matches an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Near-identical name and same month/day.
    Exact,
    /// Similar name, but looser or on a different month/day.
    NameOnly,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::NameOnly => "name_only",
        }
    }
}

/// One extracted entry paired with its best existing candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAttempt {
    pub extracted: ExtractedEntry,
    pub existing: BirthdayRecord,
    pub match_type: MatchType,
    /// `1 - distance`, in `[0, 1]`.
    pub confidence: f64,
}

/// Partition of validated entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupResult {
    pub matches: Vec<MatchAttempt>,
    pub new_entries: Vec<ExtractedEntry>,
}

impl DedupResult {
    /// Total entries across both buckets.
    pub fn len(&self) -> usize {
        self.matches.len() + self.new_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn exact_count(&self) -> usize {
        self.matches
            .iter()
            .filter(|attempt| attempt.match_type == MatchType::Exact)
            .count()
    }
}

/// Classifies one top candidate.
///
/// `exact` requires both a month/day match and a distance strictly below
/// `exact_max_distance`; every other candidate is `name_only`.
pub fn classify(score: f64, is_date_match: bool, policy: &MatchPolicy) -> MatchType {
    if is_date_match && score < policy.exact_max_distance {
        MatchType::Exact
    } else {
        MatchType::NameOnly
    }
}

/// Fuzzy deduplication over an existing-records snapshot.
#[derive(Debug, Clone)]
pub struct DeduplicationEngine<D: NameDistance = TokenSimilarity> {
    matcher: FuzzyMatcher<D>,
}

impl DeduplicationEngine<TokenSimilarity> {
    pub fn new(policy: MatchPolicy) -> Self {
        Self::with_matcher(FuzzyMatcher::new(policy))
    }
}

impl Default for DeduplicationEngine<TokenSimilarity> {
    fn default() -> Self {
        Self::new(MatchPolicy::default())
    }
}

impl<D: NameDistance> DeduplicationEngine<D> {
    pub fn with_matcher(matcher: FuzzyMatcher<D>) -> Self {
        Self { matcher }
    }

    pub fn policy(&self) -> &MatchPolicy {
        self.matcher.policy()
    }

    /// Partitions `extracted` against `existing`.
    ///
    /// Entries with an empty name are skipped; validation never produces
    /// them.
    pub fn find_duplicates(
        &self,
        extracted: &[ExtractedEntry],
        existing: &[BirthdayRecord],
    ) -> DedupResult {
        let index = self.matcher.index(existing);
        let mut result = DedupResult::default();

        for entry in extracted {
            if entry.name.trim().is_empty() {
                continue;
            }

            let Some(best) = index.search(&entry.name).into_iter().next() else {
                result.new_entries.push(entry.clone());
                continue;
            };

            let is_date_match = compare_month_day(&entry.date, &best.record.date);
            result.matches.push(MatchAttempt {
                extracted: entry.clone(),
                existing: best.record.clone(),
                match_type: classify(best.score, is_date_match, self.policy()),
                confidence: (1.0 - best.score).clamp(0.0, 1.0),
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, DeduplicationEngine, MatchType};
    use crate::import::policy::MatchPolicy;
    use crate::model::birthday::BirthdayRecord;
    use crate::model::extracted::ExtractedEntry;

    #[test]
    fn classify_requires_date_and_strict_score() {
        let policy = MatchPolicy::default();
        assert_eq!(classify(0.0, true, &policy), MatchType::Exact);
        assert_eq!(classify(0.099, true, &policy), MatchType::Exact);
        assert_eq!(classify(0.1, true, &policy), MatchType::NameOnly);
        assert_eq!(classify(0.0, false, &policy), MatchType::NameOnly);
        assert_eq!(classify(0.25, false, &policy), MatchType::NameOnly);
    }

    #[test]
    fn same_name_different_day_is_name_only() {
        let engine = DeduplicationEngine::new(MatchPolicy::default());
        let existing = vec![BirthdayRecord::new("b1", "Grace Hopper", "1906-12-09")];
        let extracted = vec![ExtractedEntry::new("Grace Hopper", "1906-12-10")];

        let result = engine.find_duplicates(&extracted, &existing);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_type, MatchType::NameOnly);
        assert_eq!(result.matches[0].confidence, 1.0);
    }

    #[test]
    fn skips_blank_names() {
        let engine = DeduplicationEngine::new(MatchPolicy::default());
        let result = engine.find_duplicates(&[ExtractedEntry::new("  ", "1990-01-01")], &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn match_type_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_value(MatchType::NameOnly).unwrap(),
            serde_json::json!("name_only")
        );
    }
}
