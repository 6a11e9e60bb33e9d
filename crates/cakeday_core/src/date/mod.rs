//! Birthdate parsing and canonical date conventions.
//!
//! # Responsibility
//! - Normalize free-form dates into canonical `YYYY-MM-DD` strings.
//! - Isolate the `0000` unknown-year sentinel behind one helper module.
//!
//! # Invariants
//! - Code outside `month_day` never inspects the year prefix directly.

pub mod month_day;
pub mod normalize;
