//! Storage contract consumed by model services.
//!
//! # Responsibility
//! - Define the fetch/save/delete primitives a storage backend must offer.
//! - Define the repository error surface shared by backends and services.
//!
//! # Invariants
//! - Filters are equality conjunctions over column names; `null` matches
//!   `IS NULL`.
//! - Backends never validate; validation happens in the model hook chain.

use crate::db::DbError;
use crate::model::record::Attributes;
use crate::schema::ValidationError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// A lookup with `require = true` matched nothing.
    NotFound {
        table: String,
        filter: Attributes,
    },
    /// An update with `require = true` changed no rows.
    NoRowsUpdated {
        table: String,
    },
    /// A delete with `require = true` removed no rows.
    NoRowsDeleted {
        table: String,
    },
    /// Update requested on a record without a primary key value.
    MissingPrimaryKey {
        table: String,
        id_attribute: String,
    },
    /// Delete requested without any filter column.
    EmptyFilter {
        table: String,
    },
    /// Table or column name outside `[A-Za-z_][A-Za-z0-9_]*`.
    InvalidIdentifier(String),
    InvalidData(String),
}

impl RepoError {
    /// Stable metadata-only code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Db(_) => "db_error",
            Self::NotFound { .. } => "not_found",
            Self::NoRowsUpdated { .. } => "no_rows_updated",
            Self::NoRowsDeleted { .. } => "no_rows_deleted",
            Self::MissingPrimaryKey { .. } => "missing_primary_key",
            Self::EmptyFilter { .. } => "empty_filter",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, filter } => write!(
                f,
                "no `{table}` record matches {}",
                Value::Object(filter.clone())
            ),
            Self::NoRowsUpdated { table } => write!(f, "no `{table}` rows were updated"),
            Self::NoRowsDeleted { table } => write!(f, "no `{table}` rows were deleted"),
            Self::MissingPrimaryKey {
                table,
                id_attribute,
            } => write!(
                f,
                "cannot update `{table}` record without a value for `{id_attribute}`"
            ),
            Self::EmptyFilter { table } => {
                write!(f, "refusing to delete from `{table}` without a filter")
            }
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid stored record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Backend primitives behind every model helper.
pub trait RecordStore {
    /// Returns the first row matching `filter`.
    fn fetch_one(&self, table: &str, filter: &Attributes) -> RepoResult<Option<Attributes>>;
    /// Returns every row matching `filter`.
    fn fetch_all(&self, table: &str, filter: &Attributes) -> RepoResult<Vec<Attributes>>;
    /// Inserts one row and returns its primary key value as stored.
    ///
    /// When `attrs` carries no usable `id_attribute` value the backend
    /// supplies one; the returned value is the key the row actually got.
    fn insert(&self, table: &str, id_attribute: &str, attrs: &Attributes) -> RepoResult<Value>;
    /// Writes `attrs` to the row whose primary key equals `id`.
    ///
    /// Returns the number of rows changed.
    fn update(
        &self,
        table: &str,
        id_attribute: &str,
        id: &Value,
        attrs: &Attributes,
    ) -> RepoResult<usize>;
    /// Deletes every row matching `filter` and returns how many went away.
    fn delete(&self, table: &str, filter: &Attributes) -> RepoResult<usize>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn fetch_one(&self, table: &str, filter: &Attributes) -> RepoResult<Option<Attributes>> {
        (**self).fetch_one(table, filter)
    }

    fn fetch_all(&self, table: &str, filter: &Attributes) -> RepoResult<Vec<Attributes>> {
        (**self).fetch_all(table, filter)
    }

    fn insert(&self, table: &str, id_attribute: &str, attrs: &Attributes) -> RepoResult<Value> {
        (**self).insert(table, id_attribute, attrs)
    }

    fn update(
        &self,
        table: &str,
        id_attribute: &str,
        id: &Value,
        attrs: &Attributes,
    ) -> RepoResult<usize> {
        (**self).update(table, id_attribute, id, attrs)
    }

    fn delete(&self, table: &str, filter: &Attributes) -> RepoResult<usize> {
        (**self).delete(table, filter)
    }
}
