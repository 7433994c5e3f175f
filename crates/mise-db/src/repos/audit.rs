//! Audit record repository.
//!
//! Append-only. Versions are assigned inside the INSERT itself so two
//! writers racing on the same entity cannot both claim the same number; the
//! `UNIQUE (record_type, record_id, version)` constraint rejects anything
//! that slips past.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use mise_core::change_set::ChangeSet;
use mise_core::entities::AuditRecord;
use mise_core::enums::{ChangeType, EntityType};
use mise_core::errors::CoreError;
use mise_core::ids::PREFIX_AUDIT;
use mise_core::payload::AuditPayload;
use tracing::debug;

use crate::MiseDb;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json};

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub record_type: Option<EntityType>,
    pub record_id: Option<String>,
    pub user_id: Option<String>,
    pub change_type: Option<ChangeType>,
    pub limit: Option<u32>,
}

const SELECT_COLUMNS: &str = "id, record_type, record_id, user_id, change_type, version, \
                              record_changes, changed_fields, created_at";

fn check_payload(payload: &AuditPayload) -> Result<(), DatabaseError> {
    if payload.entity_id.is_empty() {
        return Err(CoreError::Validation("audit payload has an empty entity_id".into()).into());
    }
    if payload.changed_fields.is_empty() {
        return Err(CoreError::Validation("audit payload has no changed fields".into()).into());
    }
    if !payload.fields_consistent() {
        return Err(CoreError::Validation(
            "audit payload changed_fields do not match field_diffs".into(),
        )
        .into());
    }
    Ok(())
}

fn row_to_record(row: &libsql::Row) -> Result<AuditRecord, DatabaseError> {
    let version = row.get::<i64>(5)?;
    Ok(AuditRecord {
        id: row.get::<String>(0)?,
        record_type: parse_enum(&row.get::<String>(1)?)?,
        record_id: row.get::<String>(2)?,
        user_id: get_opt_string(row, 3)?,
        change_type: parse_enum(&row.get::<String>(4)?)?,
        version: u32::try_from(version)
            .map_err(|_| DatabaseError::Query(format!("Invalid audit version {version}")))?,
        record_changes: parse_json::<ChangeSet>(&row.get::<String>(6)?)?,
        changed_fields: parse_json(&row.get::<String>(7)?)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl MiseDb {
    /// Persist a payload as the next version of its entity's audit history.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Invalid` for payloads with an empty entity id,
    /// no changed fields, or `changed_fields` out of step with
    /// `field_diffs`; `DatabaseError` if the INSERT fails, including a
    /// duplicate version.
    pub async fn insert_audit_record(&self, payload: &AuditPayload) -> Result<AuditRecord, DatabaseError> {
        check_payload(payload)?;

        let id = self.generate_id(PREFIX_AUDIT).await?;
        let record_changes = serde_json::to_string(&payload.field_diffs)
            .map_err(|e| DatabaseError::Query(format!("Failed to encode record_changes: {e}")))?;
        let changed_fields = serde_json::to_string(&payload.changed_fields)
            .map_err(|e| DatabaseError::Query(format!("Failed to encode changed_fields: {e}")))?;
        let created_at = Utc::now();

        let mut rows = self
            .conn
            .query(
                "INSERT INTO audit_records
                     (id, record_type, record_id, user_id, change_type, version,
                      record_changes, changed_fields, created_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, COALESCE(MAX(version), 0) + 1, ?6, ?7, ?8
                 FROM audit_records WHERE record_type = ?2 AND record_id = ?3
                 RETURNING version",
                libsql::params![
                    id.as_str(),
                    payload.entity_type.as_str(),
                    payload.entity_id.as_str(),
                    payload.actor_id.as_deref(),
                    payload.change_type.as_str(),
                    record_changes,
                    changed_fields,
                    created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let version = row.get::<i64>(0)?;
        let version = u32::try_from(version)
            .map_err(|_| DatabaseError::Query(format!("Invalid audit version {version}")))?;

        debug!(
            audit_id = %id,
            record_type = %payload.entity_type,
            record_id = %payload.entity_id,
            version,
            "audit record inserted"
        );

        Ok(AuditRecord {
            id,
            record_type: payload.entity_type,
            record_id: payload.entity_id.clone(),
            user_id: payload.actor_id.clone(),
            change_type: payload.change_type,
            version,
            record_changes: payload.field_diffs.clone(),
            changed_fields: payload.changed_fields.clone(),
            created_at,
        })
    }

    /// Query audit records with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref rt) = filter.record_type {
            params.push(libsql::Value::Text(rt.as_str().to_string()));
            conditions.push(format!("record_type = ?{}", params.len()));
        }
        if let Some(ref rid) = filter.record_id {
            params.push(libsql::Value::Text(rid.clone()));
            conditions.push(format!("record_id = ?{}", params.len()));
        }
        if let Some(ref uid) = filter.user_id {
            params.push(libsql::Value::Text(uid.clone()));
            conditions.push(format!("user_id = ?{}", params.len()));
        }
        if let Some(ref ct) = filter.change_type {
            params.push(libsql::Value::Text(ct.as_str().to_string()));
            conditions.push(format!("change_type = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLUMNS}
             FROM audit_records {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Full audit history of one entity in version order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn history(
        &self,
        record_type: EntityType,
        record_id: &str,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM audit_records
                     WHERE record_type = ?1 AND record_id = ?2
                     ORDER BY version ASC"
                ),
                libsql::params![record_type.as_str(), record_id],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Write the records matching `filter` to a JSONL file, one per line,
    /// oldest first. Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or the file write fails.
    pub async fn export_audit_jsonl(
        &self,
        filter: &AuditFilter,
        path: &Path,
    ) -> Result<usize, DatabaseError> {
        let mut records = self.query_audit(filter).await?;
        records.reverse();
        serde_jsonlines::write_json_lines(path, &records)
            .map_err(|e| DatabaseError::Other(e.into()))?;
        debug!(path = %path.display(), count = records.len(), "audit records exported");
        Ok(records.len())
    }
}
