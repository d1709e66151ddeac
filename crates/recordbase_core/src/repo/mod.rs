//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract model services delegate to.
//! - Isolate SQLite query details from validation and orchestration.
//!
//! # Invariants
//! - Stores never run validation; services call the hook chain first.
//! - Repository APIs return semantic errors (`NotFound`, `NoRowsUpdated`,
//!   `NoRowsDeleted`) in addition to DB transport errors.

pub mod record_store;
pub mod sqlite_store;

pub use record_store::{RecordStore, RepoError, RepoResult};
pub use sqlite_store::SqliteRecordStore;
