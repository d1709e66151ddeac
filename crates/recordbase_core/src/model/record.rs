//! Active record value.
//!
//! # Responsibility
//! - Hold one row worth of attributes plus its primary key attribute name.
//! - Track whether the row has been persisted yet.
//!
//! # Invariants
//! - `is_new` is `true` until the record is inserted or loaded from storage.
//! - The logical field name `id` always resolves to the primary key value,
//!   whatever the underlying column is called.

use serde_json::{Map, Value};

/// Attribute set of a record: field name to JSON value.
pub type Attributes = Map<String, Value>;

/// Logical name that always refers to the primary key.
pub const LOGICAL_ID: &str = "id";

/// One row owned by the storage layer, mediated through a model service.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id_attribute: String,
    attributes: Attributes,
    is_new: bool,
}

impl Record {
    /// Creates an unsaved record.
    pub fn new(id_attribute: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id_attribute: id_attribute.into(),
            attributes,
            is_new: true,
        }
    }

    /// Wraps attributes read back from storage.
    pub(crate) fn from_storage(id_attribute: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id_attribute: id_attribute.into(),
            attributes,
            is_new: false,
        }
    }

    /// Column name of the primary key.
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Primary key value, `None` while unset or null.
    pub fn id(&self) -> Option<&Value> {
        self.attributes
            .get(&self.id_attribute)
            .filter(|value| !value.is_null())
    }

    /// Whether this record has never been written to storage.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field.into(), value.into());
    }

    /// Merges `attributes` into the record, overwriting existing keys.
    pub fn set_all(&mut self, attributes: Attributes) {
        self.attributes.extend(attributes);
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    /// Projects the requested logical fields into a new attribute map.
    ///
    /// `id` maps to the primary key value; fields the record does not hold
    /// map to `null`.
    pub fn get_data(&self, fields: &[&str]) -> Attributes {
        fields
            .iter()
            .map(|field| {
                let source = if *field == LOGICAL_ID {
                    self.id_attribute.as_str()
                } else {
                    field
                };
                let value = self.attributes.get(source).cloned().unwrap_or(Value::Null);
                ((*field).to_string(), value)
            })
            .collect()
    }

    pub(crate) fn mark_saved(&mut self) {
        self.is_new = false;
    }
}
