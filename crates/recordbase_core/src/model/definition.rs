//! Model type definition.
//!
//! # Responsibility
//! - Bind a `ModelConfig` to its validation schema at construction time.
//! - Own the pre-save hook chain for the model.
//! - Translate logical filters to storage column names.
//!
//! # Invariants
//! - Timestamp models always carry optional `created_at`/`updated_at` date
//!   rules unless the schema declares those fields itself.
//! - The schema hook runs before any registered hook.

use crate::config::ModelConfig;
use crate::model::hook::{PreSaveHook, SaveContext, SchemaHook};
use crate::model::record::{Attributes, Record, LOGICAL_ID};
use crate::schema::{Rule, Schema, ValidationError};
use std::fmt::{Debug, Formatter};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Configuration plus schema of one model type.
pub struct ModelDef {
    config: ModelConfig,
    schema_hook: SchemaHook,
    hooks: Vec<Box<dyn PreSaveHook>>,
}

impl ModelDef {
    pub fn new(config: ModelConfig, schema: Schema) -> Self {
        let schema = if config.has_timestamps {
            schema.with_defaults(
                Schema::new()
                    .field(CREATED_AT, Rule::date().optional())
                    .field(UPDATED_AT, Rule::date().optional()),
            )
        } else {
            schema
        };

        Self {
            config,
            schema_hook: SchemaHook::new(schema),
            hooks: Vec::new(),
        }
    }

    /// Registers an extra hook that runs after schema validation.
    pub fn with_hook(mut self, hook: impl PreSaveHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub fn id_attribute(&self) -> &str {
        &self.config.id_attribute
    }

    pub fn has_timestamps(&self) -> bool {
        self.config.has_timestamps
    }

    /// Effective schema, timestamp rules included.
    pub fn schema(&self) -> &Schema {
        self.schema_hook.schema()
    }

    /// Creates an unsaved record of this model.
    pub fn forge(&self, attributes: Attributes) -> Record {
        Record::new(self.id_attribute(), attributes)
    }

    /// Rewrites a logical `id` key to the primary key column.
    ///
    /// Filters without `id` are returned unchanged.
    pub fn prepare_filter(&self, mut filter: Attributes) -> Attributes {
        if let Some(id) = filter.remove(LOGICAL_ID) {
            filter.insert(self.id_attribute().to_string(), id);
        }
        filter
    }

    /// Runs the schema hook, then every registered hook.
    ///
    /// Returns the union of the normalized sets the hooks accepted.
    pub(crate) fn run_hooks(
        &self,
        ctx: &SaveContext<'_>,
        record: &mut Record,
        written: &Attributes,
    ) -> Result<Attributes, ValidationError> {
        let mut normalized = self.schema_hook.before_save(ctx, record, written)?;
        for hook in &self.hooks {
            let accepted = hook
                .before_save(ctx, record, written)
                .map_err(|err| err.with_table(ctx.table()))?;
            normalized.extend(accepted);
        }
        Ok(normalized)
    }
}

impl Debug for ModelDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDef")
            .field("config", &self.config)
            .field("schema", self.schema())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelDef, CREATED_AT, UPDATED_AT};
    use crate::config::ModelConfig;
    use crate::model::record::Attributes;
    use crate::schema::{Rule, RuleKind, Schema};
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn prepare_filter_moves_logical_id_to_primary_key() {
        let model = ModelDef::new(ModelConfig::new("users").id_attribute("user_id"), Schema::new());

        let filter = model.prepare_filter(attrs(json!({"id": 5, "name": "a"})));
        assert_eq!(
            serde_json::Value::Object(filter),
            json!({"user_id": 5, "name": "a"})
        );
    }

    #[test]
    fn prepare_filter_leaves_filters_without_id_alone() {
        let model = ModelDef::new(ModelConfig::new("users").id_attribute("user_id"), Schema::new());

        let filter = model.prepare_filter(attrs(json!({"name": "a"})));
        assert_eq!(serde_json::Value::Object(filter), json!({"name": "a"}));
    }

    #[test]
    fn timestamp_models_gain_optional_date_rules() {
        let model = ModelDef::new(
            ModelConfig::new("users").with_timestamps(),
            Schema::new().field("name", Rule::string()),
        );

        for field in [CREATED_AT, UPDATED_AT] {
            let rule = model.schema().rule(field).unwrap();
            assert_eq!(rule.kind(), RuleKind::Date);
            assert!(!rule.is_required());
        }
    }

    #[test]
    fn plain_models_keep_schema_as_declared() {
        let model = ModelDef::new(
            ModelConfig::new("users"),
            Schema::new().field("name", Rule::string()),
        );
        assert_eq!(model.schema().len(), 1);
        assert!(!model.schema().contains(CREATED_AT));
    }
}
