//! Record model layer.
//!
//! # Responsibility
//! - Define the record value, its model definition and per-call options.
//! - Define the pre-save hook contract and the schema-driven hook.
//!
//! # Invariants
//! - A model's schema is fixed when its `ModelDef` is built.
//! - Every save passes through the model's hook chain before storage.

pub mod definition;
pub mod hook;
pub mod options;
pub mod record;

pub use definition::{ModelDef, CREATED_AT, UPDATED_AT};
pub use hook::{PreSaveHook, SaveContext, SchemaHook};
pub use options::{Options, SaveMethod};
pub use record::{Attributes, Record, LOGICAL_ID};
