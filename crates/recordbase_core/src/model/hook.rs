//! Pre-save interception.
//!
//! # Responsibility
//! - Resolve the operation context (insert vs update) of one save.
//! - Define the hook contract the save path calls before touching storage.
//! - Provide the schema-driven validation hook every model carries.
//!
//! # Invariants
//! - Validation mode is `Update` when the record exists, or when the caller
//!   asked for `method = Update` or `patch = true`; `Insert` otherwise.
//! - Insert mode validates every record attribute against the full schema.
//! - Update mode validates only written attributes that the schema declares.
//! - A failing hook leaves storage untouched.

use crate::model::options::{Options, SaveMethod};
use crate::model::record::{Attributes, Record};
use crate::schema::{Schema, ValidationError};

/// Transient description of the save being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveContext<'a> {
    table: &'a str,
    is_new: bool,
    method: Option<SaveMethod>,
    patch: bool,
}

impl<'a> SaveContext<'a> {
    pub fn new(table: &'a str, record: &Record, options: &Options) -> Self {
        Self {
            table,
            is_new: record.is_new(),
            method: options.method,
            patch: options.is_patch(),
        }
    }

    pub fn table(&self) -> &'a str {
        self.table
    }

    pub fn is_patch(&self) -> bool {
        self.patch
    }

    /// Which attribute subset the hooks must check.
    pub fn validation_mode(&self) -> SaveMethod {
        if !self.is_new || self.method == Some(SaveMethod::Update) || self.patch {
            SaveMethod::Update
        } else {
            SaveMethod::Insert
        }
    }

    /// Which storage primitive the save ends in.
    pub fn persist_method(&self) -> SaveMethod {
        match self.method {
            Some(method) => method,
            None if self.is_new => SaveMethod::Insert,
            None => SaveMethod::Update,
        }
    }
}

/// Hook invoked before a record is written.
///
/// Implementations may rewrite the record in place and return the attribute
/// set they accepted. Returning an error aborts the save.
pub trait PreSaveHook {
    fn before_save(
        &self,
        ctx: &SaveContext<'_>,
        record: &mut Record,
        written: &Attributes,
    ) -> Result<Attributes, ValidationError>;
}

/// Validates saves against the model schema and applies its normalization.
#[derive(Debug, Clone)]
pub struct SchemaHook {
    schema: Schema,
}

impl SchemaHook {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl PreSaveHook for SchemaHook {
    fn before_save(
        &self,
        ctx: &SaveContext<'_>,
        record: &mut Record,
        written: &Attributes,
    ) -> Result<Attributes, ValidationError> {
        let validation = match ctx.validation_mode() {
            SaveMethod::Update => {
                let touched: Attributes = written
                    .iter()
                    .filter(|(key, _)| self.schema.contains(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                self.schema
                    .pick(touched.keys().map(String::as_str))
                    .validate(&touched)
            }
            SaveMethod::Insert => self.schema.validate(record.attributes()),
        };

        let normalized = validation.map_err(|err| err.with_table(ctx.table()))?;
        record.set_all(normalized.clone());
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::{PreSaveHook, SaveContext, SchemaHook};
    use crate::model::options::{Options, SaveMethod};
    use crate::model::record::{Attributes, Record};
    use crate::schema::{FieldErrorKind, Rule, Schema};
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn hook() -> SchemaHook {
        SchemaHook::new(
            Schema::new()
                .field("name", Rule::string().required())
                .field("age", Rule::integer()),
        )
    }

    #[test]
    fn mode_follows_new_status_and_option_flags() {
        let fresh = Record::new("id", Attributes::new());
        let stored = Record::from_storage("id", Attributes::new());

        let insert = SaveContext::new("people", &fresh, &Options::new());
        assert_eq!(insert.validation_mode(), SaveMethod::Insert);
        assert_eq!(insert.persist_method(), SaveMethod::Insert);

        let existing = SaveContext::new("people", &stored, &Options::new());
        assert_eq!(existing.validation_mode(), SaveMethod::Update);
        assert_eq!(existing.persist_method(), SaveMethod::Update);

        let patched = SaveContext::new("people", &fresh, &Options::new().patch(true));
        assert_eq!(patched.validation_mode(), SaveMethod::Update);
        assert_eq!(patched.persist_method(), SaveMethod::Insert);

        let forced = SaveContext::new("people", &fresh, &Options::new().method(SaveMethod::Update));
        assert_eq!(forced.validation_mode(), SaveMethod::Update);
        assert_eq!(forced.persist_method(), SaveMethod::Update);
    }

    #[test]
    fn insert_mode_requires_full_schema_and_tags_table() {
        let mut record = Record::new("id", attrs(json!({"age": 4})));
        let ctx = SaveContext::new("people", &record, &Options::new());
        let written = record.attributes().clone();

        let err = hook().before_save(&ctx, &mut record, &written).unwrap_err();
        assert_eq!(err.table.as_deref(), Some("people"));
        assert_eq!(err.field("name"), Some(&FieldErrorKind::Required));
    }

    #[test]
    fn update_mode_only_checks_written_schema_keys() {
        let mut record = Record::from_storage("id", attrs(json!({"id": 1, "age": 4})));
        let written = attrs(json!({"age": "5", "untracked": true}));
        record.set_all(written.clone());
        let ctx = SaveContext::new("people", &record, &Options::new().patch(true));

        let normalized = hook().before_save(&ctx, &mut record, &written).unwrap();
        assert_eq!(serde_json::Value::Object(normalized), json!({"age": 5}));
        assert_eq!(record.get("age"), Some(&json!(5)));
        assert_eq!(record.get("untracked"), Some(&json!(true)));
    }

    #[test]
    fn successful_insert_overwrites_record_with_normalized_values() {
        let mut record = Record::new("id", attrs(json!({"name": "ada", "age": "36"})));
        let ctx = SaveContext::new("people", &record, &Options::new());
        let written = record.attributes().clone();

        hook().before_save(&ctx, &mut record, &written).unwrap();
        assert_eq!(record.get("age"), Some(&json!(36)));
    }
}
