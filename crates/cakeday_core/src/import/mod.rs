//! Birthday import pipeline.
//!
//! # Responsibility
//! - Decode and validate AI-extracted birthday records.
//! - Classify them against existing birthdays with fuzzy name matching.
//! - Drive human review of every candidate before anything is written.
//!
//! # Invariants
//! - Stages run to completion in order: validate, dedup, review.
//! - Nothing in this module writes except `ReviewWorkflow::commit`, one
//!   record per call.

pub mod dedup;
pub mod fuzzy;
pub mod payload;
pub mod policy;
pub mod review;
pub mod validate;
