//! Declarative validation schemas.
//!
//! # Responsibility
//! - Map field names to acceptance rules for one model type.
//! - Validate an attribute set and return its normalized form.
//!
//! # Invariants
//! - A schema is immutable once handed to a model definition.
//! - Keys not declared by the schema are rejected unless `allow_unknown()`
//!   was set.
//! - Every failing field is reported, in field-name order.

pub mod error;
pub mod rule;

use crate::model::record::Attributes;
use std::collections::BTreeMap;

pub use error::{FieldError, FieldErrorKind, ValidationError};
pub use rule::{Rule, RuleKind};

/// Field name to rule mapping.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, Rule>,
    allow_unknown: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or replaces) the rule for `name`.
    pub fn field(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    /// Lets undeclared keys pass through validation untouched.
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    pub fn allows_unknown(&self) -> bool {
        self.allow_unknown
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the sub-schema restricted to `keys`.
    ///
    /// Keys the schema does not declare are ignored.
    pub fn pick<'a, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields = keys
            .into_iter()
            .filter_map(|key| {
                self.fields
                    .get(key)
                    .map(|rule| (key.to_string(), rule.clone()))
            })
            .collect();
        Self {
            fields,
            allow_unknown: self.allow_unknown,
        }
    }

    /// Adds every rule of `defaults` whose field is not declared yet.
    pub fn with_defaults(mut self, defaults: Self) -> Self {
        for (name, rule) in defaults.fields {
            self.fields.entry(name).or_insert(rule);
        }
        self
    }

    /// Validates `attrs` against the whole schema.
    ///
    /// Returns the normalized attribute set on success.
    pub fn validate(&self, attrs: &Attributes) -> Result<Attributes, ValidationError> {
        let mut normalized = Attributes::new();
        let mut details = Vec::new();

        for (name, rule) in &self.fields {
            match attrs.get(name) {
                Some(value) => match rule.apply(value) {
                    Ok(value) => {
                        normalized.insert(name.clone(), value);
                    }
                    Err(kind) => details.push(FieldError::new(name.as_str(), kind)),
                },
                None if rule.is_required() => {
                    details.push(FieldError::new(name.as_str(), FieldErrorKind::Required));
                }
                None => {}
            }
        }

        for (name, value) in attrs {
            if self.fields.contains_key(name) {
                continue;
            }
            if self.allow_unknown {
                normalized.insert(name.clone(), value.clone());
            } else {
                details.push(FieldError::new(name.as_str(), FieldErrorKind::NotAllowed));
            }
        }

        if details.is_empty() {
            Ok(normalized)
        } else {
            details.sort_by(|left, right| left.field.cmp(&right.field));
            Err(ValidationError::new(details))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldErrorKind, Rule, Schema};
    use crate::model::record::Attributes;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn person_schema() -> Schema {
        Schema::new()
            .field("name", Rule::string().required())
            .field("age", Rule::number().optional())
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = person_schema()
            .validate(&attrs(json!({"age": 3})))
            .unwrap_err();
        assert_eq!(err.field("name"), Some(&FieldErrorKind::Required));
        assert!(err.table.is_none());
    }

    #[test]
    fn valid_input_is_normalized() {
        let normalized = person_schema()
            .validate(&attrs(json!({"name": "ada", "age": "36"})))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(normalized),
            json!({"name": "ada", "age": 36})
        );
    }

    #[test]
    fn unknown_keys_are_rejected_unless_allowed() {
        let input = attrs(json!({"name": "ada", "nickname": "countess"}));

        let err = person_schema().validate(&input).unwrap_err();
        assert_eq!(err.field("nickname"), Some(&FieldErrorKind::NotAllowed));

        let normalized = person_schema().allow_unknown().validate(&input).unwrap();
        assert_eq!(normalized.get("nickname"), Some(&json!("countess")));
    }

    #[test]
    fn all_failures_are_collected_in_field_order() {
        let err = person_schema()
            .validate(&attrs(json!({"age": "old", "zzz": 1})))
            .unwrap_err();
        let fields: Vec<_> = err.details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["age", "name", "zzz"]);
    }

    #[test]
    fn pick_keeps_only_declared_keys() {
        let reduced = person_schema().pick(["age", "email"]);
        assert_eq!(reduced.keys().collect::<Vec<_>>(), vec!["age"]);
        assert!(reduced.validate(&attrs(json!({"age": 1}))).is_ok());
    }

    #[test]
    fn with_defaults_never_overrides_declared_rules() {
        let schema = person_schema().with_defaults(
            Schema::new()
                .field("name", Rule::any())
                .field("created_at", Rule::date()),
        );
        assert_eq!(schema.len(), 3);
        assert!(schema.rule("name").unwrap().is_required());
    }
}
