//! Validating record base.
//!
//! Declarative schema validation around record saves, plus create/find/
//! update/destroy/upsert helpers that delegate to a `RecordStore`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use config::{ModelConfig, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    Attributes, ModelDef, Options, PreSaveHook, Record, SaveContext, SaveMethod, SchemaHook,
};
pub use repo::{RecordStore, RepoError, RepoResult, SqliteRecordStore};
pub use schema::{FieldError, FieldErrorKind, Rule, RuleKind, Schema, ValidationError};
pub use service::{RecordService, UpdateOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
