//! Model use-case services.
//!
//! # Responsibility
//! - Expose create/find/update/destroy/upsert helpers per model type.
//! - Keep callers decoupled from the concrete `RecordStore`.

pub mod record_service;

pub use record_service::{RecordService, UpdateOutcome};
