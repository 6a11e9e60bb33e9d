//! Domain model for birthday records and import candidates.
//!
//! # Responsibility
//! - Define the persisted birthday record shape seen by the import core.
//! - Define loosely-typed extraction input and its closed validated form.
//!
//! # Invariants
//! - Every persisted record is identified by a stable string `id`.
//! - Dates are canonical `YYYY-MM-DD`; `0000` marks an unknown year.

pub mod birthday;
pub mod extracted;
