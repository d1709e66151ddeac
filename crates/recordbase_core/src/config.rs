//! Static configuration for models and storage connections.
//!
//! # Responsibility
//! - Describe per-model persistence metadata (table, primary key, timestamps).
//! - Describe connection bootstrap settings used by `db::open_db*`.
//!
//! # Invariants
//! - `id_attribute` defaults to `id`.
//! - Both structs deserialize from JSON with every optional key defaulted.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ID_ATTRIBUTE: &str = "id";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Persistence metadata for one model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Storage table the model reads and writes.
    pub table_name: String,
    /// Column holding the primary key.
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    /// Maintain `created_at`/`updated_at` on save.
    #[serde(default)]
    pub has_timestamps: bool,
}

impl ModelConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            id_attribute: default_id_attribute(),
            has_timestamps: false,
        }
    }

    pub fn id_attribute(mut self, id_attribute: impl Into<String>) -> Self {
        self.id_attribute = id_attribute.into();
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.has_timestamps = true;
        self
    }

    /// Parses a JSON model description.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn default_id_attribute() -> String {
    DEFAULT_ID_ATTRIBUTE.to_string()
}

/// SQLite connection bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long a writer waits on a locked database.
    pub busy_timeout_ms: u64,
    /// Whether `PRAGMA foreign_keys` is switched on.
    pub foreign_keys: bool,
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelConfig, StoreConfig};

    #[test]
    fn model_config_defaults_primary_key_and_timestamps() {
        let config = ModelConfig::from_json(r#"{"table_name": "users"}"#).unwrap();
        assert_eq!(config, ModelConfig::new("users"));
        assert_eq!(config.id_attribute, "id");
        assert!(!config.has_timestamps);
    }

    #[test]
    fn model_config_reads_overrides() {
        let config = ModelConfig::from_json(
            r#"{"table_name": "users", "id_attribute": "user_id", "has_timestamps": true}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            ModelConfig::new("users")
                .id_attribute("user_id")
                .with_timestamps()
        );
    }

    #[test]
    fn store_config_fills_missing_keys() {
        let config: StoreConfig = serde_json::from_str(r#"{"foreign_keys": false}"#).unwrap();
        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout().as_secs(), 5);
    }
}
