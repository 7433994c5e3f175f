//! Generic entity repository.
//!
//! One set of INSERT/SELECT/UPDATE/DELETE statements for every catalog
//! entity, generated from the static column declarations. Table and column
//! names only ever come from the catalog.

use chrono::Utc;
use mise_core::catalog::EntitySchema;
use mise_core::ids::prefix_for;
use mise_core::row::Row;

use crate::MiseDb;
use crate::error::DatabaseError;
use crate::helpers::{json_to_sql, quote_ident, sql_to_json};

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

fn has_column(schema: &EntitySchema, name: &str) -> bool {
    schema.column(name).is_some()
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

impl MiseDb {
    /// Insert a row and return its generated id.
    ///
    /// Missing `created_at`/`updated_at` are filled with the current time.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Invalid` for undeclared columns or mistyped
    /// values, or `DatabaseError` if the INSERT fails.
    pub async fn insert_entity(&self, schema: &EntitySchema, row: &Row) -> Result<String, DatabaseError> {
        schema.validate_row(row)?;
        let id = self.generate_id(prefix_for(schema.entity_type)).await?;
        let now = Utc::now().to_rfc3339();

        let mut columns = vec![quote_ident("id")];
        let mut params = vec![libsql::Value::Text(id.clone())];
        for column in schema.columns {
            let value = match row.get(column.name) {
                Some(value) => json_to_sql(schema.table, column, value)?,
                None if column.name == CREATED_AT || column.name == UPDATED_AT => {
                    libsql::Value::Text(now.clone())
                }
                None => continue,
            };
            columns.push(quote_ident(column.name));
            params.push(value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table,
            columns.join(", "),
            placeholders(params.len())
        );
        self.conn
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        Ok(id)
    }

    /// Read every declared column of one row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a stored value cannot be decoded.
    pub async fn get_entity(&self, schema: &EntitySchema, id: &str) -> Result<Option<Row>, DatabaseError> {
        let columns: Vec<String> = schema.column_names().map(quote_ident).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            columns.join(", "),
            schema.table
        );
        let mut rows = self.conn.query(&sql, [id]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let mut out = Row::new();
        for (idx, column) in (0_i32..).zip(schema.columns) {
            let value = sql_to_json(column, row.get_value(idx)?)?;
            out.insert(column.name.to_string(), value);
        }
        Ok(Some(out))
    }

    /// Apply column changes to one row.
    ///
    /// Only columns whose value actually differs are written, and
    /// `updated_at` is bumped only when at least one did. Returns `false`
    /// when no row has this id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Invalid` for undeclared columns or mistyped
    /// values, or `DatabaseError` if the UPDATE fails.
    pub async fn update_entity(
        &self,
        schema: &EntitySchema,
        id: &str,
        changes: &Row,
    ) -> Result<bool, DatabaseError> {
        schema.validate_row(changes)?;
        let Some(current) = self.get_entity(schema, id).await? else {
            return Ok(false);
        };

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for column in schema.columns {
            let Some(value) = changes.get(column.name) else {
                continue;
            };
            let converted = json_to_sql(schema.table, column, value)?;
            let stored = current.get(column.name).unwrap_or(&serde_json::Value::Null);
            if json_to_sql(schema.table, column, stored)? == converted {
                continue;
            }
            params.push(converted);
            assignments.push(format!("{} = ?{}", quote_ident(column.name), params.len()));
        }
        if assignments.is_empty() {
            return Ok(true);
        }
        if has_column(schema, UPDATED_AT) && !changes.contains_key(UPDATED_AT) {
            params.push(libsql::Value::Text(Utc::now().to_rfc3339()));
            assignments.push(format!("{} = ?{}", quote_ident(UPDATED_AT), params.len()));
        }

        params.push(libsql::Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{} RETURNING id",
            schema.table,
            assignments.join(", "),
            params.len()
        );
        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Delete one row. Returns `true` only when a row was removed.
    ///
    /// The result comes from the statement's own `RETURNING` rows, not the
    /// connection-wide change count, which concurrent audit writers share.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the DELETE fails.
    pub async fn delete_entity(&self, schema: &EntitySchema, id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("DELETE FROM {} WHERE id = ?1 RETURNING id", schema.table),
                [id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }
}
