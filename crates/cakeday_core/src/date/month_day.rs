//! Canonical date helpers aware of the unknown-year sentinel.
//!
//! # Responsibility
//! - Own every comparison that has to know about the `0000` year sentinel.
//! - Split canonical `YYYY-MM-DD` strings into their parts.
//!
//! # Invariants
//! - Month/day comparison never looks at the year.
//! - `0000` is the only year value treated as "unknown".

use chrono::NaiveDate;

/// Year prefix used by canonical dates whose birth year is unknown.
pub const UNKNOWN_YEAR: &str = "0000";

/// Leap year used to validate month/day pairs that carry no real year.
const SENTINEL_CHECK_YEAR: i32 = 2000;

/// Returns the `MM-DD` part of a canonical date, if it has one.
pub fn month_day(date: &str) -> Option<&str> {
    let (year, rest) = date.split_once('-')?;
    if year.len() != 4 || rest.len() != 5 || rest.as_bytes()[2] != b'-' {
        return None;
    }
    Some(rest)
}

/// Returns whether `date` is canonical `YYYY-MM-DD` naming a real day.
pub fn is_canonical(date: &str) -> bool {
    let Some(rest) = month_day(date) else {
        return false;
    };
    let parts = (
        date[..4].parse::<i32>(),
        rest[..2].parse::<u32>(),
        rest[3..].parse::<u32>(),
    );
    match parts {
        (Ok(year), Ok(month), Ok(day)) => is_valid_day(year, month, day),
        _ => false,
    }
}

/// Compares two canonical dates by month and day only.
///
/// `compare_month_day("1990-06-20", "0000-06-20")` is `true`: a record with
/// an unknown year still matches one with a known year.
pub fn compare_month_day(left: &str, right: &str) -> bool {
    match (month_day(left), month_day(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Returns whether a canonical date carries the unknown-year sentinel.
pub fn is_year_unknown(date: &str) -> bool {
    date.starts_with(UNKNOWN_YEAR) && month_day(date).is_some()
}

/// Returns the birth year of a canonical date, `None` for the sentinel.
pub fn birth_year(date: &str) -> Option<i32> {
    month_day(date)?;
    let year = date.get(..4)?.parse::<i32>().ok()?;
    if year == 0 {
        None
    } else {
        Some(year)
    }
}

/// Formats a canonical date. A `None` year emits the `0000` sentinel.
pub fn format_canonical(year: Option<i32>, month: u32, day: u32) -> String {
    match year {
        Some(year) => format!("{year:04}-{month:02}-{day:02}"),
        None => format!("{UNKNOWN_YEAR}-{month:02}-{day:02}"),
    }
}

/// Returns whether `(year, month, day)` names a real calendar day.
///
/// Sentinel year `0` is checked against a leap year so `0000-02-29` is
/// accepted for people born on leap day.
pub fn is_valid_day(year: i32, month: u32, day: u32) -> bool {
    let check_year = if year == 0 { SENTINEL_CHECK_YEAR } else { year };
    NaiveDate::from_ymd_opt(check_year, month, day).is_some()
}

#[cfg(test)]
mod tests {
    use super::{
        birth_year, compare_month_day, format_canonical, is_canonical, is_valid_day,
        is_year_unknown, month_day,
    };

    #[test]
    fn month_day_ignores_year() {
        assert!(compare_month_day("1990-06-20", "0000-06-20"));
        assert!(compare_month_day("0000-06-20", "2001-06-20"));
        assert!(!compare_month_day("1990-06-20", "1990-06-21"));
    }

    #[test]
    fn month_day_rejects_non_canonical_input() {
        assert_eq!(month_day("June 20"), None);
        assert_eq!(month_day("1990-6-20"), None);
        assert!(!compare_month_day("garbage", "garbage"));
    }

    #[test]
    fn canonical_check_requires_real_day() {
        assert!(is_canonical("0000-02-29"));
        assert!(is_canonical("1990-06-20"));
        assert!(!is_canonical("1990-13-01"));
        assert!(!is_canonical("19x0-06-20"));
    }

    #[test]
    fn birth_year_treats_sentinel_as_unknown() {
        assert_eq!(birth_year("1990-06-20"), Some(1990));
        assert_eq!(birth_year("0000-06-20"), None);
        assert!(is_year_unknown("0000-06-20"));
        assert!(!is_year_unknown("1990-06-20"));
    }

    #[test]
    fn sentinel_year_accepts_leap_day() {
        assert!(is_valid_day(0, 2, 29));
        assert!(!is_valid_day(2023, 2, 29));
        assert!(!is_valid_day(0, 4, 31));
        assert_eq!(format_canonical(None, 2, 29), "0000-02-29");
    }
}
