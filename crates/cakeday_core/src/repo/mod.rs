//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the birthday store contract used by the import pipeline.
//! - Isolate SQLite query details from import orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `UpsertRequest::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod birthday_repo;
