//! Model-level persistence helpers.
//!
//! # Responsibility
//! - Translate filter/data pairs into store fetch/save/delete calls.
//! - Run timestamps and the pre-save hook chain on every save.
//! - Apply the documented option defaults per helper.
//!
//! # Invariants
//! - Nothing reaches the store when a hook rejects the save.
//! - Caller-set option flags always win over helper defaults.
//! - `update_by` reports failures as an `UpdateOutcome` value; every other
//!   helper propagates them as `Err`.

use crate::model::definition::{ModelDef, CREATED_AT, UPDATED_AT};
use crate::model::hook::SaveContext;
use crate::model::options::{Options, SaveMethod};
use crate::model::record::{Attributes, Record};
use crate::repo::record_store::{RecordStore, RepoError, RepoResult};
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Instant;

/// Result of `update_by`.
///
/// Errors are carried as data instead of being returned through `Err`.
#[must_use]
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The matching record after the partial update.
    Updated(Record),
    /// No match and the caller passed `require = false`.
    NotFound,
    /// Fetching or saving failed.
    Failed(RepoError),
}

impl UpdateOutcome {
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Updated(record) => Some(record),
            Self::NotFound | Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Converts back to the propagating form used by the other helpers.
    pub fn into_result(self) -> RepoResult<Option<Record>> {
        match self {
            Self::Updated(record) => Ok(Some(record)),
            Self::NotFound => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Validating persistence helpers for one model type.
pub struct RecordService<S: RecordStore> {
    model: ModelDef,
    store: S,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(model: ModelDef, store: S) -> Self {
        Self { model, store }
    }

    pub fn model(&self) -> &ModelDef {
        &self.model
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an unsaved record of this model.
    pub fn forge(&self, attributes: Attributes) -> Record {
        self.model.forge(attributes)
    }

    /// Constructs and persists a new record.
    pub fn create(&self, data: Attributes, options: Options) -> RepoResult<Record> {
        let mut record = self.forge(data);
        self.save(&mut record, None, &options)?;
        Ok(record)
    }

    /// Merges `data` into `record`, validates and persists it.
    ///
    /// Returns the normalized attribute set accepted by the hook chain.
    ///
    /// # Contract
    /// - Insert vs update follows `options.method`, else `record.is_new()`.
    /// - Patch saves send only the written attributes to the store.
    /// - Updates touching no row fail with `NoRowsUpdated` unless
    ///   `require = false`.
    pub fn save(
        &self,
        record: &mut Record,
        data: Option<Attributes>,
        options: &Options,
    ) -> RepoResult<Attributes> {
        let started_at = Instant::now();
        let table = self.model.table_name();

        let mut written = match data {
            Some(data) => {
                record.set_all(data.clone());
                data
            }
            None => record.attributes().clone(),
        };

        let ctx = SaveContext::new(table, record, options);
        let method = ctx.persist_method();
        if self.model.has_timestamps() {
            stamp(record, &mut written, method);
        }

        let normalized = match self.model.run_hooks(&ctx, record, &written) {
            Ok(normalized) => normalized,
            Err(err) => {
                warn!(
                    "event=record_save module=service status=error table={} mode={} error_code=validation_failed fields={}",
                    table,
                    ctx.validation_mode().as_str(),
                    err.details.len()
                );
                return Err(err.into());
            }
        };

        match method {
            SaveMethod::Insert => {
                let id = self
                    .store
                    .insert(table, self.model.id_attribute(), record.attributes())?;
                record.set(self.model.id_attribute(), id);
            }
            SaveMethod::Update => {
                let id = record
                    .id()
                    .cloned()
                    .ok_or_else(|| RepoError::MissingPrimaryKey {
                        table: table.to_string(),
                        id_attribute: self.model.id_attribute().to_string(),
                    })?;
                let payload = if ctx.is_patch() {
                    written
                        .keys()
                        .filter_map(|key| {
                            record.get(key).map(|value| (key.clone(), value.clone()))
                        })
                        .collect()
                } else {
                    record.attributes().clone()
                };

                let changed = self
                    .store
                    .update(table, self.model.id_attribute(), &id, &payload)?;
                if changed == 0 && options.requires(true) {
                    return Err(RepoError::NoRowsUpdated {
                        table: table.to_string(),
                    });
                }
            }
        }
        record.mark_saved();

        info!(
            "event=record_save module=service status=ok table={} method={} patch={} duration_ms={}",
            table,
            method.as_str(),
            ctx.is_patch(),
            started_at.elapsed().as_millis()
        );
        Ok(normalized)
    }

    /// Fetches one record by `filter` and applies a partial update.
    ///
    /// Defaults: `patch = true`, `require = true`. Any failure along the
    /// fetch-then-save chain is returned as `UpdateOutcome::Failed`, unlike
    /// `update_by_id` which propagates it.
    pub fn update_by(
        &self,
        filter: Attributes,
        data: Attributes,
        options: Options,
    ) -> UpdateOutcome {
        let options = options.or_patch(true).or_require(true);
        let filter = self.model.prepare_filter(filter);

        match self.fetch_then_save(filter, data, &options) {
            Ok(Some(record)) => UpdateOutcome::Updated(record),
            Ok(None) => UpdateOutcome::NotFound,
            Err(err) => {
                warn!(
                    "event=update_by module=service status=error table={} error_code={}",
                    self.model.table_name(),
                    err.code()
                );
                UpdateOutcome::Failed(err)
            }
        }
    }

    /// Fetches one record by primary key and applies a partial update.
    ///
    /// Defaults: `patch = true`, `require = true`. Returns `Ok(None)` only
    /// when nothing matched and the caller passed `require = false`.
    pub fn update_by_id(
        &self,
        id: impl Into<Value>,
        data: Attributes,
        options: Options,
    ) -> RepoResult<Option<Record>> {
        let options = options.or_patch(true).or_require(true);
        let mut filter = Attributes::new();
        filter.insert(self.model.id_attribute().to_string(), id.into());
        self.fetch_then_save(filter, data, &options)
    }

    /// Fetches every record matching `filter`.
    ///
    /// An empty result only fails when the caller passed `require = true`.
    pub fn find_all(&self, filter: Attributes, options: Options) -> RepoResult<Vec<Record>> {
        let filter = self.model.prepare_filter(filter);
        let rows = self.store.fetch_all(self.model.table_name(), &filter)?;
        if rows.is_empty() && options.requires(false) {
            return Err(self.not_found(filter));
        }

        debug!(
            "event=find_all module=service status=ok table={} rows={}",
            self.model.table_name(),
            rows.len()
        );
        Ok(rows
            .into_iter()
            .map(|attrs| Record::from_storage(self.model.id_attribute(), attrs))
            .collect())
    }

    /// Fetches exactly one record; defaults to `require = true`.
    pub fn find_one(&self, filter: Attributes, options: Options) -> RepoResult<Option<Record>> {
        let options = options.or_require(true);
        self.fetch(self.model.prepare_filter(filter), &options)
    }

    /// Deletes every record matching `filter`; defaults to `require = true`.
    ///
    /// Returns the number of deleted rows. An empty filter is rejected.
    pub fn destroy_by(&self, filter: Attributes, options: Options) -> RepoResult<usize> {
        let options = options.or_require(true);
        let table = self.model.table_name();
        let filter = self.model.prepare_filter(filter);
        if filter.is_empty() {
            return Err(RepoError::EmptyFilter {
                table: table.to_string(),
            });
        }

        let deleted = self.store.delete(table, &filter)?;
        if deleted == 0 && options.requires(true) {
            return Err(RepoError::NoRowsDeleted {
                table: table.to_string(),
            });
        }

        info!("event=destroy_by module=service status=ok table={table} rows={deleted}");
        Ok(deleted)
    }

    /// Returns the record matching `data`, creating it when absent.
    ///
    /// The created record holds `options.defaults` overlaid with `data`.
    pub fn find_or_create(&self, data: Attributes, options: Options) -> RepoResult<Record> {
        if let Some(record) = self.find_one(data.clone(), options.clone().require(false))? {
            return Ok(record);
        }

        let mut attributes = options.defaults.clone();
        attributes.extend(data);
        self.create(attributes, options)
    }

    /// Updates the record matching `select` with `update`, or creates one
    /// from both when nothing matches.
    ///
    /// The update defaults to `require = false`, so a row removed between
    /// lookup and save is not an error.
    pub fn upsert(
        &self,
        select: Attributes,
        update: Attributes,
        options: Options,
    ) -> RepoResult<Record> {
        match self.find_one(select.clone(), options.clone().require(false))? {
            Some(mut record) => {
                let options = options
                    .or_patch(true)
                    .or_require(false)
                    .or_method(SaveMethod::Update);
                self.save(&mut record, Some(update), &options)?;
                Ok(record)
            }
            None => {
                let mut attributes = select;
                attributes.extend(update);
                self.create(attributes, options.method(SaveMethod::Insert))
            }
        }
    }

    fn fetch(&self, filter: Attributes, options: &Options) -> RepoResult<Option<Record>> {
        match self.store.fetch_one(self.model.table_name(), &filter)? {
            Some(attrs) => Ok(Some(Record::from_storage(
                self.model.id_attribute(),
                attrs,
            ))),
            None if options.requires(false) => Err(self.not_found(filter)),
            None => Ok(None),
        }
    }

    fn fetch_then_save(
        &self,
        filter: Attributes,
        data: Attributes,
        options: &Options,
    ) -> RepoResult<Option<Record>> {
        let Some(mut record) = self.fetch(filter, options)? else {
            return Ok(None);
        };
        self.save(&mut record, Some(data), options)?;
        Ok(Some(record))
    }

    fn not_found(&self, filter: Attributes) -> RepoError {
        RepoError::NotFound {
            table: self.model.table_name().to_string(),
            filter,
        }
    }
}

/// Sets `updated_at`, and `created_at` on inserts that lack one.
fn stamp(record: &mut Record, written: &mut Attributes, method: SaveMethod) {
    let now = Value::from(Utc::now().timestamp_millis());
    if method == SaveMethod::Insert && record.get(CREATED_AT).map_or(true, Value::is_null) {
        record.set(CREATED_AT, now.clone());
        written.insert(CREATED_AT.to_string(), now.clone());
    }
    record.set(UPDATED_AT, now.clone());
    written.insert(UPDATED_AT.to_string(), now);
}
