//! Approximate name lookup over an existing-records snapshot.
//!
//! # Responsibility
//! - Index existing birthdays by normalized name once per session.
//! - Return candidates ranked best-first by distance (`0` = identical).
//!
//! # Invariants
//! - Only the `name` field participates in matching.
//! - Results never exceed `MatchPolicy::max_candidates`.
//! - Equal scores keep snapshot order; the first-indexed record wins.

use crate::import::policy::MatchPolicy;
use crate::model::birthday::BirthdayRecord;
use std::cmp::Ordering;

/// Name reduced to lowercase alphanumeric tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub tokens: Vec<String>,
}

impl NormalizedName {
    pub fn new(raw: &str) -> Self {
        let lowered = raw
            .chars()
            .flat_map(char::to_lowercase)
            .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
            .collect::<String>();
        Self {
            tokens: lowered.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Replaceable distance between two normalized names, in `[0, 1]`.
pub trait NameDistance {
    fn distance(&self, query: &NormalizedName, candidate: &NormalizedName) -> f64;
}

/// Order-insensitive token matcher.
///
/// Each token of the shorter name is paired with its most similar token in
/// the longer name; token similarity averages Jaro-Winkler and normalized
/// Levenshtein. The mean is scaled down when the names have different
/// token counts, so `John` vs `John Smith` stays a candidate without
/// reading as identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSimilarity;

const COVERAGE_BASE: f64 = 0.7;

impl NameDistance for TokenSimilarity {
    fn distance(&self, query: &NormalizedName, candidate: &NormalizedName) -> f64 {
        if query.is_empty() || candidate.is_empty() {
            return 1.0;
        }

        let (shorter, longer) = if query.tokens.len() <= candidate.tokens.len() {
            (&query.tokens, &candidate.tokens)
        } else {
            (&candidate.tokens, &query.tokens)
        };

        let total = shorter
            .iter()
            .map(|token| {
                longer
                    .iter()
                    .map(|other| token_similarity(token, other))
                    .fold(0.0, f64::max)
            })
            .sum::<f64>();
        let mean = total / shorter.len() as f64;
        let coverage = shorter.len() as f64 / longer.len() as f64;
        let similarity = mean * (COVERAGE_BASE + (1.0 - COVERAGE_BASE) * coverage);

        (1.0 - similarity).clamp(0.0, 1.0)
    }
}

fn token_similarity(left: &str, right: &str) -> f64 {
    (strsim::jaro_winkler(left, right) + strsim::normalized_levenshtein(left, right)) / 2.0
}

/// One ranked lookup result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate<'a> {
    pub record: &'a BirthdayRecord,
    /// Position of `record` in the indexed snapshot.
    pub position: usize,
    /// Distance score, lower is better.
    pub score: f64,
}

/// Fuzzy name matcher configured by a [`MatchPolicy`].
#[derive(Debug, Clone)]
pub struct FuzzyMatcher<D: NameDistance = TokenSimilarity> {
    distance: D,
    policy: MatchPolicy,
}

impl FuzzyMatcher<TokenSimilarity> {
    pub fn new(policy: MatchPolicy) -> Self {
        Self::with_distance(TokenSimilarity, policy)
    }
}

impl Default for FuzzyMatcher<TokenSimilarity> {
    fn default() -> Self {
        Self::new(MatchPolicy::default())
    }
}

impl<D: NameDistance> FuzzyMatcher<D> {
    pub fn with_distance(distance: D, policy: MatchPolicy) -> Self {
        Self { distance, policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Builds a lookup handle over a read-only snapshot.
    pub fn index<'a>(&'a self, existing: &'a [BirthdayRecord]) -> NameIndex<'a, D> {
        NameIndex {
            matcher: self,
            entries: existing
                .iter()
                .map(|record| (record, NormalizedName::new(&record.name)))
                .collect(),
        }
    }
}

/// Prepared snapshot index returned by [`FuzzyMatcher::index`].
#[derive(Debug)]
pub struct NameIndex<'a, D: NameDistance> {
    matcher: &'a FuzzyMatcher<D>,
    entries: Vec<(&'a BirthdayRecord, NormalizedName)>,
}

impl<'a, D: NameDistance> NameIndex<'a, D> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns candidates within `max_distance`, best first.
    ///
    /// A name with no alphanumeric content yields no candidates.
    pub fn search(&self, name: &str) -> Vec<RankedCandidate<'a>> {
        let query = NormalizedName::new(name);
        if query.is_empty() {
            return Vec::new();
        }

        let policy = self.matcher.policy;
        let mut ranked = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(position, (record, normalized))| {
                let score = self.matcher.distance.distance(&query, normalized);
                (score <= policy.max_distance).then_some(RankedCandidate {
                    record: *record,
                    position,
                    score,
                })
            })
            .collect::<Vec<_>>();

        // Stable sort keeps snapshot order among equal scores.
        ranked.sort_by(|left, right| {
            left.score
                .partial_cmp(&right.score)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(policy.max_candidates);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::{FuzzyMatcher, NameDistance, NormalizedName, TokenSimilarity};
    use crate::import::policy::MatchPolicy;
    use crate::model::birthday::BirthdayRecord;

    fn distance(left: &str, right: &str) -> f64 {
        TokenSimilarity.distance(&NormalizedName::new(left), &NormalizedName::new(right))
    }

    #[test]
    fn normalized_name_drops_punctuation_and_case() {
        let name = NormalizedName::new("  O'Brien,  MARY-Jane ");
        assert_eq!(name.tokens, vec!["o", "brien", "mary", "jane"]);
    }

    #[test]
    fn identical_and_reordered_names_have_zero_distance() {
        assert_eq!(distance("John Smith", "john smith"), 0.0);
        assert_eq!(distance("Smith, John", "John Smith"), 0.0);
    }

    #[test]
    fn single_typo_is_closer_than_partial_overlap() {
        let typo = distance("Jon Smith", "John Smith");
        let partial = distance("John", "John Smith");
        assert!(typo < 0.1, "typo distance {typo}");
        assert!(partial > 0.1 && partial < 0.3, "partial distance {partial}");
    }

    #[test]
    fn unrelated_names_are_far_apart() {
        assert!(distance("Totally New Person", "John Smith") > 0.5);
        assert_eq!(distance("Alice", ""), 1.0);
    }

    #[test]
    fn search_limits_and_ranks_candidates() {
        let existing = vec![
            BirthdayRecord::new("1", "Jon Smith", "1990-06-20"),
            BirthdayRecord::new("2", "John Smith", "1990-06-20"),
            BirthdayRecord::new("3", "Jane Doe", "1985-01-01"),
            BirthdayRecord::new("4", "John Smith", "1970-02-02"),
        ];
        let matcher = FuzzyMatcher::new(MatchPolicy {
            max_candidates: 2,
            ..MatchPolicy::default()
        });
        let index = matcher.index(&existing);

        let results = index.search("John Smith");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.id, "2");
        assert_eq!(results[1].record.id, "4");
        assert_eq!(results[0].score, 0.0);
        assert!(index.search("!!!").is_empty());
    }
}
