use cakeday_core::{
    validate, BirthdayRecord, DateNormalizer, DeduplicationEngine, ExtractedEntry, MatchPolicy,
    MatchType, RawExtractedRecord,
};

fn existing() -> Vec<BirthdayRecord> {
    vec![
        BirthdayRecord::new("b-john", "John Smith", "1990-06-20"),
        BirthdayRecord::new("b-ada", "Ada Lovelace", "1815-12-10"),
        BirthdayRecord::new("b-grace", "Grace Hopper", "0000-12-09"),
    ]
}

#[test]
fn near_name_same_day_is_a_potential_duplicate() {
    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let extracted = vec![ExtractedEntry::new("Jon Smyth", "1990-06-20")];

    let result = engine.find_duplicates(&extracted, &existing());
    assert_eq!(result.matches.len(), 1);
    assert!(result.new_entries.is_empty());

    let attempt = &result.matches[0];
    assert_eq!(attempt.existing.id, "b-john");
    let score = 1.0 - attempt.confidence;
    assert!(score > 0.1 && score < 0.3, "unexpected score {score}");
    assert_eq!(attempt.match_type, MatchType::NameOnly);
}

#[test]
fn typo_on_same_day_is_exact() {
    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let extracted = vec![ExtractedEntry::new("Jon Smith", "1990-06-20")];

    let result = engine.find_duplicates(&extracted, &existing());
    assert_eq!(result.matches[0].match_type, MatchType::Exact);
    assert!(result.matches[0].confidence > 0.9);
}

#[test]
fn unknown_person_lands_in_new_entries() {
    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let extracted = vec![ExtractedEntry::new("Totally New Person", "1985-01-01")];

    let result = engine.find_duplicates(&extracted, &existing());
    assert!(result.matches.is_empty());
    assert_eq!(result.new_entries, extracted);
}

#[test]
fn unparseable_dates_never_reach_dedup() {
    let raw = vec![
        RawExtractedRecord::from_strings("X", "not-a-date"),
        RawExtractedRecord::from_strings("John Smith", "June 20th, 1990"),
    ];
    let entries = validate(&raw, &DateNormalizer::default());
    assert_eq!(entries.len(), 1);

    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let result = engine.find_duplicates(&entries, &existing());
    assert_eq!(result.len(), 1);
    assert!(result.new_entries.iter().all(|entry| entry.name != "X"));
    assert!(result.matches.iter().all(|attempt| attempt.extracted.name != "X"));
}

#[test]
fn only_the_top_ranked_candidate_is_reported() {
    // The weaker candidate comes first so snapshot order cannot decide.
    let existing = vec![
        BirthdayRecord::new("b-jon", "Jon Smith", "1970-01-01"),
        BirthdayRecord::new("b-john", "John Smith", "1990-06-20"),
    ];
    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let extracted = vec![ExtractedEntry::new("John Smith", "1990-06-20")];

    let result = engine.find_duplicates(&extracted, &existing);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].existing.id, "b-john");
    assert_eq!(result.matches[0].match_type, MatchType::Exact);
    assert_eq!(result.matches[0].confidence, 1.0);
}

#[test]
fn every_entry_lands_in_exactly_one_bucket() {
    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let extracted = vec![
        ExtractedEntry::new("John Smith", "1990-06-20"),
        ExtractedEntry::new("Ada Lovelace", "0000-12-10"),
        ExtractedEntry::new("Linus Torvalds", "1969-12-28"),
        ExtractedEntry::new("Grace Hopper", "1906-12-09"),
        ExtractedEntry::new("Margaret Hamilton", "1936-08-17"),
    ];

    let result = engine.find_duplicates(&extracted, &existing());
    assert_eq!(result.len(), extracted.len());
    for entry in &extracted {
        let in_matches = result
            .matches
            .iter()
            .filter(|attempt| &attempt.extracted == entry)
            .count();
        let in_new = result.new_entries.iter().filter(|new| *new == entry).count();
        assert_eq!(in_matches + in_new, 1, "{} misplaced", entry.name);
    }
}

#[test]
fn unknown_year_still_matches_on_month_and_day() {
    let engine = DeduplicationEngine::new(MatchPolicy::default());
    let extracted = vec![
        ExtractedEntry::new("Ada Lovelace", "0000-12-10"),
        ExtractedEntry::new("Grace Hopper", "1906-12-09"),
    ];

    let result = engine.find_duplicates(&extracted, &existing());
    assert_eq!(result.matches.len(), 2);
    assert!(result
        .matches
        .iter()
        .all(|attempt| attempt.match_type == MatchType::Exact));
    assert_eq!(result.exact_count(), 2);
}

#[test]
fn tighter_policy_turns_candidates_into_new_entries() {
    let engine = DeduplicationEngine::new(MatchPolicy {
        max_distance: 0.05,
        exact_max_distance: 0.01,
        max_candidates: 1,
    });
    let extracted = vec![ExtractedEntry::new("Jon Smyth", "1990-06-20")];

    let result = engine.find_duplicates(&extracted, &existing());
    assert!(result.matches.is_empty());
    assert_eq!(result.new_entries.len(), 1);
}

#[test]
fn empty_snapshot_makes_everything_new() {
    let engine = DeduplicationEngine::default();
    let extracted = vec![
        ExtractedEntry::new("John Smith", "1990-06-20"),
        ExtractedEntry::new("Ada Lovelace", "1815-12-10"),
    ];

    let result = engine.find_duplicates(&extracted, &[]);
    assert!(result.matches.is_empty());
    assert_eq!(result.new_entries, extracted);
}
