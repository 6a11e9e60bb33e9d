//! Free-form birthdate normalization.
//!
//! # Responsibility
//! - Turn noisy OCR/LLM date strings into canonical `YYYY-MM-DD`.
//! - Emit `0000-MM-DD` when the input carries no explicit 4-digit year.
//!
//! # Invariants
//! - Output is always a real calendar day in canonical form.
//! - A year the parser had to assume is never emitted.
//! - Unparseable input fails with `DateParseError`; it is never defaulted.
//! - `normalize(normalize(x)) == normalize(x)` for every accepted `x`.

use crate::date::month_day::{format_canonical, is_valid_day};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static STRICT_ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid strict iso regex"));
static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid ordinal regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));
static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s+(?:of\s+)?([a-z]{3,})\.?(?:\s+(\d{4}))?\b")
        .expect("valid day-month regex")
});
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,})\.?\s+(\d{1,2})(?:\s+(\d{4}))?\b")
        .expect("valid month-day regex")
});

const MONTHS: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Leap year used when probing yearless month/day; 02-29 must not depend
/// on the current year.
const LEAP_PROBE_YEAR: i32 = 2000;

const TEXTUAL_FORMATS: [&str; 5] = [
    "%B %d %Y",
    "%d %B %Y",
    "%Y %B %d",
    "%A %B %d %Y",
    "%A %d %B %Y",
];

const ISO_LIKE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Raised when no normalization rule accepts the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    /// Original input, untouched.
    pub raw: String,
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized date `{}`", self.raw)
    }
}

impl Error for DateParseError {}

/// Component order applied to numeric `a/b/yyyy` dates.
///
/// The preferred order is tried first; the other order is used only when
/// the preferred one does not name a real day (`25/12/1990`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlashDateOrder {
    /// `MM/DD/YYYY`.
    #[default]
    MonthFirst,
    /// `DD/MM/YYYY`.
    DayFirst,
}

/// Tunables for [`DateNormalizer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerOptions {
    pub slash_order: SlashDateOrder,
    /// Year appended to yearless inputs while probing month/day.
    ///
    /// `None` uses the current local year. The year itself is never emitted.
    pub reference_year: Option<i32>,
}

/// Rule-ordered birthdate normalizer.
#[derive(Debug, Clone, Default)]
pub struct DateNormalizer {
    options: NormalizerOptions,
}

impl DateNormalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> NormalizerOptions {
        self.options
    }

    /// Normalizes one raw date string.
    ///
    /// Rules, first success wins:
    /// 1. strict `YYYY-MM-DD` passthrough
    /// 2. cleanup (ordinals, commas, whitespace)
    /// 3. calendar parsing; year kept only if the input wrote those 4 digits
    /// 4. yearless input: calendar parsing with the reference year (then a
    ///    leap year) appended, year dropped
    /// 5. `<day> <Month> [year]` / `<Month> <day> [year]` patterns
    ///
    /// # Errors
    /// - `DateParseError` when no rule accepts the input.
    pub fn normalize(&self, raw: &str) -> Result<String, DateParseError> {
        let trimmed = raw.trim();
        if let Some(canonical) = strict_iso(trimmed) {
            return Ok(canonical);
        }

        let cleaned = clean(trimmed);
        if cleaned.is_empty() {
            return Err(DateParseError {
                raw: raw.to_string(),
            });
        }

        let written = written_years(trimmed);
        if let Some(date) = self.parse_calendar(&cleaned) {
            let year = written.contains(&date.year()).then_some(date.year());
            // A written year the parser did not read back means it split the
            // digits (`June 1990` as day 19 of year 90).
            if year.is_some() || written.is_empty() {
                if let Some(canonical) = canonical_from(year, date.month(), date.day()) {
                    return Ok(canonical);
                }
            }
        }

        if written.is_empty() {
            let reference_year = self
                .options
                .reference_year
                .unwrap_or_else(|| Local::now().year());
            for probe_year in [reference_year, LEAP_PROBE_YEAR] {
                for separator in [" ", "/", "."] {
                    let probe = format!("{cleaned}{separator}{probe_year}");
                    if let Some(date) = self.parse_calendar(&probe) {
                        return Ok(format_canonical(None, date.month(), date.day()));
                    }
                }
            }
        }

        if let Some(canonical) = match_day_month(&cleaned).or_else(|| match_month_day(&cleaned)) {
            return Ok(canonical);
        }

        Err(DateParseError {
            raw: raw.to_string(),
        })
    }

    fn parse_calendar(&self, value: &str) -> Option<NaiveDate> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.date_naive());
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
            return Some(parsed.date());
        }

        let slash_formats = match self.options.slash_order {
            SlashDateOrder::MonthFirst => ["%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y"],
            SlashDateOrder::DayFirst => ["%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y"],
        };

        // Two-digit-leading numeric shapes go first so `6/7/12` never reads
        // as year 6.
        slash_formats
            .iter()
            .chain(["%d.%m.%Y"].iter())
            .chain(ISO_LIKE_FORMATS.iter())
            .chain(TEXTUAL_FORMATS.iter())
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }
}

/// Normalizes with default options (month-first slash dates, current year).
pub fn normalize_date(raw: &str) -> Result<String, DateParseError> {
    DateNormalizer::default().normalize(raw)
}

fn strict_iso(value: &str) -> Option<String> {
    let caps = STRICT_ISO_RE.captures(value)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let day = caps[3].parse::<u32>().ok()?;
    is_valid_day(year, month, day).then(|| value.to_string())
}

/// Every 4-digit number written in `value`.
fn written_years(value: &str) -> Vec<i32> {
    DIGIT_RUN_RE
        .find_iter(value)
        .filter(|run| run.as_str().len() == 4)
        .filter_map(|run| run.as_str().parse::<i32>().ok())
        .collect()
}

fn clean(value: &str) -> String {
    let without_ordinals = ORDINAL_RE.replace_all(value, "$1");
    let without_commas = without_ordinals.replace(',', " ");
    WHITESPACE_RE
        .replace_all(&without_commas, " ")
        .trim()
        .to_string()
}

fn canonical_from(year: Option<i32>, month: u32, day: u32) -> Option<String> {
    match year {
        Some(year) if !(0..=9999).contains(&year) => None,
        _ => Some(format_canonical(year, month, day)),
    }
}

fn month_from_token(token: &str) -> Option<u32> {
    let prefix = token.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == prefix)
        .map(|(_, month)| *month)
}

fn match_day_month(value: &str) -> Option<String> {
    DAY_MONTH_RE.captures_iter(value).find_map(|caps| {
        let day = caps[1].parse::<u32>().ok()?;
        let month = month_from_token(&caps[2])?;
        let year = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());
        pattern_canonical(year, month, day)
    })
}

fn match_month_day(value: &str) -> Option<String> {
    MONTH_DAY_RE.captures_iter(value).find_map(|caps| {
        let month = month_from_token(&caps[1])?;
        let day = caps[2].parse::<u32>().ok()?;
        let year = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());
        pattern_canonical(year, month, day)
    })
}

fn pattern_canonical(year: Option<i32>, month: u32, day: u32) -> Option<String> {
    if !is_valid_day(year.unwrap_or(0), month, day) {
        return None;
    }
    canonical_from(year.filter(|year| *year != 0), month, day)
}

#[cfg(test)]
mod tests {
    use super::{
        clean, month_from_token, written_years, DateNormalizer, NormalizerOptions, SlashDateOrder,
    };

    fn normalizer() -> DateNormalizer {
        DateNormalizer::new(NormalizerOptions {
            slash_order: SlashDateOrder::MonthFirst,
            reference_year: Some(2023),
        })
    }

    #[test]
    fn clean_strips_ordinals_commas_and_spacing() {
        assert_eq!(clean("June  20th,   1990"), "June 20 1990");
        assert_eq!(clean("1st of March"), "1 of March");
    }

    #[test]
    fn month_lookup_uses_three_letter_prefix() {
        assert_eq!(month_from_token("Sept"), Some(9));
        assert_eq!(month_from_token("DECEMBER"), Some(12));
        assert_eq!(month_from_token("the"), None);
        assert_eq!(month_from_token("ju"), None);
    }

    #[test]
    fn yearless_leap_day_survives_non_leap_reference_year() {
        assert_eq!(normalizer().normalize("29 February").unwrap(), "0000-02-29");
        assert_eq!(normalizer().normalize("Feb 29th").unwrap(), "0000-02-29");
    }

    #[test]
    fn numeric_yearless_leap_day_ignores_reference_year() {
        assert_eq!(normalizer().normalize("02/29").unwrap(), "0000-02-29");
        assert_eq!(normalizer().normalize("29.02").unwrap(), "0000-02-29");
        assert!(normalizer().normalize("02/30").is_err());
    }

    #[test]
    fn written_years_only_counts_four_digit_runs() {
        assert_eq!(written_years("June 20 1990"), vec![1990]);
        assert_eq!(written_years("6/7/12"), Vec::<i32>::new());
        assert_eq!(written_years("12345 and 0990"), vec![990]);
    }

    #[test]
    fn abbreviated_month_with_period_uses_patterns() {
        assert_eq!(normalizer().normalize("Sept. 5 1984").unwrap(), "1984-09-05");
        assert_eq!(normalizer().normalize("Jun. 20").unwrap(), "0000-06-20");
    }

    #[test]
    fn strict_iso_rejects_impossible_days() {
        assert!(normalizer().normalize("1990-02-30").is_err());
        assert_eq!(normalizer().normalize(" 1990-06-20 ").unwrap(), "1990-06-20");
    }
}
