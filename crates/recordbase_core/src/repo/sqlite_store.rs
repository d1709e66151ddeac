//! SQLite implementation of `RecordStore`.
//!
//! # Responsibility
//! - Translate equality filters and attribute maps into parameterized SQL.
//! - Convert between JSON values and SQLite storage classes.
//!
//! # Invariants
//! - Identifiers are checked and double-quoted; values are always bound.
//! - Booleans are stored as `0`/`1`; arrays and objects as JSON text.
//! - BLOB columns are reported as invalid data instead of being guessed at.

use crate::model::record::Attributes;
use crate::repo::record_store::{RecordStore, RepoError, RepoResult};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Number, Value};

/// SQLite-backed record store over a migrated connection.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn select(
        &self,
        table: &str,
        filter: &Attributes,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Attributes>> {
        let mut binds = Vec::new();
        let mut sql = format!(
            "SELECT * FROM {} WHERE {}",
            quote_ident(table)?,
            where_clause(filter, &mut binds)?
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_row(row, &columns)?);
        }

        Ok(records)
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn fetch_one(&self, table: &str, filter: &Attributes) -> RepoResult<Option<Attributes>> {
        Ok(self.select(table, filter, Some(1))?.into_iter().next())
    }

    fn fetch_all(&self, table: &str, filter: &Attributes) -> RepoResult<Vec<Attributes>> {
        self.select(table, filter, None)
    }

    fn insert(&self, table: &str, id_attribute: &str, attrs: &Attributes) -> RepoResult<Value> {
        let table = quote_ident(table)?;
        let id_column = quote_ident(id_attribute)?;
        // RETURNING reads the stored key, including column defaults and
        // non-rowid keys.
        let (sql, binds) = if attrs.is_empty() {
            (
                format!("INSERT INTO {table} DEFAULT VALUES RETURNING {id_column};"),
                Vec::new(),
            )
        } else {
            let columns = attrs
                .keys()
                .map(|name| quote_ident(name))
                .collect::<RepoResult<Vec<_>>>()?;
            let placeholders = vec!["?"; columns.len()].join(", ");
            (
                format!(
                    "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING {id_column};",
                    columns.join(", ")
                ),
                attrs.values().map(to_sql_value).collect::<Vec<_>>(),
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let id = match rows.next()? {
            Some(row) => read_value(row.get_ref(0)?, id_attribute)?,
            None => {
                return Err(RepoError::InvalidData(format!(
                    "insert returned no `{id_attribute}` value"
                )));
            }
        };
        Ok(id)
    }

    fn update(
        &self,
        table: &str,
        id_attribute: &str,
        id: &Value,
        attrs: &Attributes,
    ) -> RepoResult<usize> {
        let table = quote_ident(table)?;
        let id_column = quote_ident(id_attribute)?;

        let mut assignments = Vec::new();
        let mut binds = Vec::new();
        for (name, value) in attrs {
            if name == id_attribute {
                continue;
            }
            assignments.push(format!("{} = ?", quote_ident(name)?));
            binds.push(to_sql_value(value));
        }
        // Nothing to write still reports whether the row exists.
        if assignments.is_empty() {
            assignments.push(format!("{id_column} = {id_column}"));
        }
        binds.push(to_sql_value(id));

        let changed = self.conn.execute(
            &format!(
                "UPDATE {table} SET {} WHERE {id_column} = ?;",
                assignments.join(", ")
            ),
            params_from_iter(binds),
        )?;
        Ok(changed)
    }

    fn delete(&self, table: &str, filter: &Attributes) -> RepoResult<usize> {
        let mut binds = Vec::new();
        let sql = format!(
            "DELETE FROM {} WHERE {};",
            quote_ident(table)?,
            where_clause(filter, &mut binds)?
        );
        let deleted = self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(deleted)
    }
}

fn quote_ident(name: &str) -> RepoResult<String> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RepoError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{name}\""))
}

fn where_clause(filter: &Attributes, binds: &mut Vec<SqlValue>) -> RepoResult<String> {
    if filter.is_empty() {
        return Ok("1 = 1".to_string());
    }

    let mut conditions = Vec::with_capacity(filter.len());
    for (name, value) in filter {
        let column = quote_ident(name)?;
        if value.is_null() {
            conditions.push(format!("{column} IS NULL"));
        } else {
            conditions.push(format!("{column} = ?"));
            binds.push(to_sql_value(value));
        }
    }
    Ok(conditions.join(" AND "))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn parse_row(row: &Row<'_>, columns: &[String]) -> RepoResult<Attributes> {
    let mut attrs = Attributes::new();
    for (index, column) in columns.iter().enumerate() {
        attrs.insert(column.clone(), read_value(row.get_ref(index)?, column)?);
    }
    Ok(attrs)
}

fn read_value(value: ValueRef<'_>, column: &str) -> RepoResult<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(integer) => Ok(Value::from(integer)),
        ValueRef::Real(real) => Ok(Number::from_f64(real).map_or(Value::Null, Value::Number)),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|_| {
                RepoError::InvalidData(format!("non UTF-8 text in column `{column}`"))
            })?;
            Ok(Value::String(text.to_string()))
        }
        ValueRef::Blob(_) => Err(RepoError::InvalidData(format!(
            "unsupported BLOB value in column `{column}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{quote_ident, to_sql_value, where_clause};
    use crate::model::record::Attributes;
    use crate::repo::record_store::RepoError;
    use rusqlite::types::Value as SqlValue;
    use serde_json::json;

    #[test]
    fn quote_ident_rejects_injection_attempts() {
        assert_eq!(quote_ident("user_id").unwrap(), "\"user_id\"");
        assert!(matches!(
            quote_ident("name\"; DROP TABLE users; --"),
            Err(RepoError::InvalidIdentifier(_))
        ));
        assert!(quote_ident("1st").is_err());
        assert!(quote_ident("").is_err());
    }

    #[test]
    fn where_clause_binds_values_and_handles_null() {
        let filter: Attributes = json!({"age": null, "name": "ada"})
            .as_object()
            .cloned()
            .unwrap();
        let mut binds = Vec::new();

        let clause = where_clause(&filter, &mut binds).unwrap();
        assert_eq!(clause, "\"age\" IS NULL AND \"name\" = ?");
        assert_eq!(binds, vec![SqlValue::Text("ada".to_string())]);
    }

    #[test]
    fn json_values_map_to_storage_classes() {
        assert_eq!(to_sql_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(
            to_sql_value(&json!(["a"])),
            SqlValue::Text("[\"a\"]".to_string())
        );
    }
}
