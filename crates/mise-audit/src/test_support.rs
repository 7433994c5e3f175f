//! In-memory stores for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use mise_core::catalog::EntitySchema;
use mise_core::change_set::ChangeSet;
use mise_core::entities::AuditRecord;
use mise_core::enums::{ChangeType, EntityType};
use mise_core::errors::CoreError;
use mise_core::ids::{PREFIX_AUDIT, prefix_for};
use mise_core::payload::{AuditPayload, PAYLOAD_VERSION};
use mise_core::row::Row;
use serde_json::json;
use thiserror::Error;

use crate::store::{AuditStore, EntityStore};

/// A valid payload with a single `name` change.
pub fn payload(entity_type: EntityType, entity_id: &str, change_type: ChangeType) -> AuditPayload {
    let diffs: ChangeSet = [mise_core::change_set::FieldChange::new(
        "name",
        json!("Old"),
        json!("New"),
    )]
    .into_iter()
    .collect();
    AuditPayload {
        v: PAYLOAD_VERSION,
        entity_type,
        entity_id: entity_id.to_string(),
        actor_id: None,
        change_type,
        changed_fields: diffs.fields(),
        field_diffs: diffs,
        captured_at: Utc::now(),
    }
}

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error("store unavailable")]
    Unavailable,
}

#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    rows: Mutex<HashMap<(EntityType, String), Row>>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
    fail_snapshots: AtomicBool,
}

impl MemoryEntityStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    pub fn row(&self, entity_type: EntityType, id: &str) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(&(entity_type, id.to_string()))
            .cloned()
    }

    fn check_writes(&self) -> Result<(), MemoryStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(MemoryStoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl EntityStore for MemoryEntityStore {
    type Error = MemoryStoreError;

    async fn snapshot(&self, schema: &EntitySchema, id: &str) -> Result<Option<Row>, Self::Error> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(MemoryStoreError::Unavailable);
        }
        Ok(self.row(schema.entity_type, id))
    }

    async fn insert(&self, schema: &EntitySchema, row: &Row) -> Result<String, Self::Error> {
        schema.validate_row(row)?;
        self.check_writes()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{}-{n:08x}", prefix_for(schema.entity_type));
        self.rows
            .lock()
            .unwrap()
            .insert((schema.entity_type, id.clone()), row.clone());
        Ok(id)
    }

    async fn update(
        &self,
        schema: &EntitySchema,
        id: &str,
        changes: &Row,
    ) -> Result<bool, Self::Error> {
        schema.validate_row(changes)?;
        self.check_writes()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&(schema.entity_type, id.to_string())) else {
            return Ok(false);
        };
        for (column, value) in changes {
            row.insert(column.clone(), value.clone());
        }
        Ok(true)
    }

    async fn delete(&self, schema: &EntitySchema, id: &str) -> Result<bool, Self::Error> {
        self.check_writes()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .remove(&(schema.entity_type, id.to_string()))
            .is_some())
    }
}

#[derive(Debug, Error)]
#[error("audit store rejected the record")]
pub struct RecordingError;

/// Audit store that keeps records in memory and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingAuditStore {
    records: Mutex<Vec<AuditRecord>>,
    attempts: AtomicU64,
    fail: bool,
}

impl RecordingAuditStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl AuditStore for RecordingAuditStore {
    type Error = RecordingError;

    async fn create_record(&self, payload: &AuditPayload) -> Result<AuditRecord, Self::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RecordingError);
        }
        let mut records = self.records.lock().unwrap();
        let previous = records
            .iter()
            .filter(|r| r.record_type == payload.entity_type && r.record_id == payload.entity_id)
            .count();
        let record = AuditRecord {
            id: format!("{PREFIX_AUDIT}-{:08x}", records.len() + 1),
            record_type: payload.entity_type,
            record_id: payload.entity_id.clone(),
            user_id: payload.actor_id.clone(),
            change_type: payload.change_type,
            version: u32::try_from(previous + 1).unwrap(),
            record_changes: payload.field_diffs.clone(),
            changed_fields: payload.changed_fields.clone(),
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }
}
