//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the import pipeline over a birthday store.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod import_service;
