//! Extraction result validation.
//!
//! # Responsibility
//! - Close loosely-typed raw records into `ExtractedEntry` values.
//! - Drop records without a name or a normalizable date.
//!
//! # Invariants
//! - Pure: no I/O, no logging; callers log the returned counts.
//! - Kept entries preserve input order.

use crate::date::normalize::DateNormalizer;
use crate::model::extracted::{ExtractedEntry, RawExtractedRecord};

/// Why a raw record was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingName,
    MissingDate,
    UnparseableDate(String),
}

impl DropReason {
    /// Stable label for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingDate => "missing_date",
            Self::UnparseableDate(_) => "unparseable_date",
        }
    }
}

/// One excluded record, by position in the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub index: usize,
    pub reason: DropReason,
}

/// Validation output with diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub entries: Vec<ExtractedEntry>,
    pub dropped: Vec<DroppedRecord>,
}

impl ValidationReport {
    /// Counts dropped records carrying the given reason label.
    pub fn dropped_count(&self, reason: &str) -> usize {
        self.dropped
            .iter()
            .filter(|record| record.reason.as_str() == reason)
            .count()
    }
}

/// Validates raw records, silently dropping invalid ones.
pub fn validate(raw: &[RawExtractedRecord], normalizer: &DateNormalizer) -> Vec<ExtractedEntry> {
    validate_with_report(raw, normalizer).entries
}

/// Validates raw records and reports every drop with its reason.
pub fn validate_with_report(
    raw: &[RawExtractedRecord],
    normalizer: &DateNormalizer,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, record) in raw.iter().enumerate() {
        match validate_record(record, normalizer) {
            Ok(entry) => report.entries.push(entry),
            Err(reason) => report.dropped.push(DroppedRecord { index, reason }),
        }
    }

    report
}

fn validate_record(
    record: &RawExtractedRecord,
    normalizer: &DateNormalizer,
) -> Result<ExtractedEntry, DropReason> {
    let name = record.name_text().ok_or(DropReason::MissingName)?;
    let raw_date = record.date_text().ok_or(DropReason::MissingDate)?;
    let date = normalizer
        .normalize(&raw_date)
        .map_err(|err| DropReason::UnparseableDate(err.raw))?;

    Ok(ExtractedEntry {
        name,
        date,
        notes: record.notes_text(),
        relationship: record.relationship_text(),
        confidence: record.confidence_text(),
    })
}

#[cfg(test)]
mod tests {
    use super::{validate, validate_with_report, DropReason};
    use crate::date::normalize::{DateNormalizer, NormalizerOptions};
    use crate::model::extracted::RawExtractedRecord;

    fn normalizer() -> DateNormalizer {
        DateNormalizer::new(NormalizerOptions {
            reference_year: Some(2023),
            ..NormalizerOptions::default()
        })
    }

    #[test]
    fn keeps_valid_records_in_order_with_canonical_dates() {
        let raw = vec![
            RawExtractedRecord::from_strings("Ada", "December 10th, 1815"),
            RawExtractedRecord::from_strings("Grace", "9 Dec"),
        ];

        let entries = validate(&raw, &normalizer());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "1815-12-10");
        assert_eq!(entries[1].name, "Grace");
        assert_eq!(entries[1].date, "0000-12-09");
    }

    #[test]
    fn reports_each_drop_reason() {
        let raw = vec![
            RawExtractedRecord::from_strings("  ", "1990-06-20"),
            RawExtractedRecord {
                date: None,
                ..RawExtractedRecord::from_strings("No Date", "")
            },
            RawExtractedRecord::from_strings("X", "not-a-date"),
            RawExtractedRecord::from_strings("Kept", "1990-06-20"),
        ];

        let report = validate_with_report(&raw, &normalizer());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.dropped.len(), 3);
        assert_eq!(report.dropped[0].reason, DropReason::MissingName);
        assert_eq!(report.dropped[1].reason, DropReason::MissingDate);
        assert_eq!(
            report.dropped[2].reason,
            DropReason::UnparseableDate("not-a-date".to_string())
        );
        assert_eq!(report.dropped_count("unparseable_date"), 1);
    }
}
