//! Lifecycle hook dispatcher.
//!
//! Wraps every entity mutation with before/after snapshots and routes the
//! resulting change record: creates and updates go through the async sink,
//! deletes are written to the audit store before `delete` returns.
//!
//! The mutation's result is always the store's result. Nothing that happens
//! on the audit side can turn a successful mutation into an error.

use std::sync::Arc;

use mise_core::catalog::{EntityCatalog, EntitySchema};
use mise_core::change_set::ChangeSet;
use mise_core::context::AuditContext;
use mise_core::enums::{ChangeType, EntityType};
use mise_core::errors::CoreError;
use mise_core::row::Row;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::builder::ChangeRecordBuilder;
use crate::sink::AuditSinkHandle;
use crate::store::{AuditStore, EntityStore};

/// Errors returned to the caller of a dispatched mutation.
#[derive(Debug, Error)]
pub enum DispatchError<E: std::error::Error + 'static> {
    /// The entity type has no catalog schema; nothing was written.
    #[error(transparent)]
    Catalog(#[from] CoreError),

    /// The entity store failed the mutation.
    #[error(transparent)]
    Store(E),
}

pub struct LifecycleDispatcher<E, A> {
    entities: E,
    audit_store: Arc<A>,
    sink: AuditSinkHandle,
    builder: ChangeRecordBuilder,
    catalog: Arc<EntityCatalog>,
    enabled: bool,
}

impl<E: EntityStore, A: AuditStore> LifecycleDispatcher<E, A> {
    pub fn new(
        entities: E,
        audit_store: Arc<A>,
        sink: AuditSinkHandle,
        builder: ChangeRecordBuilder,
        catalog: Arc<EntityCatalog>,
    ) -> Self {
        Self {
            entities,
            audit_store,
            sink,
            builder,
            catalog,
            enabled: true,
        }
    }

    /// Turn auditing on or off. When off, mutations pass straight through.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub const fn entities(&self) -> &E {
        &self.entities
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    fn schema(&self, entity_type: EntityType) -> Result<&EntitySchema, DispatchError<E::Error>> {
        Ok(self.catalog.get(entity_type)?)
    }

    /// Insert a row and queue its creation record.
    ///
    /// # Errors
    ///
    /// Returns the entity store's error when the insert fails, or
    /// `DispatchError::Catalog` for an unregistered entity type.
    pub async fn create(
        &self,
        ctx: &AuditContext,
        entity_type: EntityType,
        row: &Row,
    ) -> Result<String, DispatchError<E::Error>> {
        let schema = self.schema(entity_type)?;
        let id = self
            .entities
            .insert(schema, row)
            .await
            .map_err(DispatchError::Store)?;

        if self.enabled {
            if let Some(after) = self.snapshot_for_audit(schema, &id, "after").await {
                let changes = ChangeSet::for_create(schema, &after);
                self.enqueue(ctx, entity_type, &id, ChangeType::Create, &changes);
            }
        }
        Ok(id)
    }

    /// Apply column changes and queue the update record.
    ///
    /// Returns `false` when no row matched `id`. Saves that change nothing
    /// produce no record.
    ///
    /// # Errors
    ///
    /// Returns the entity store's error when the update fails, or
    /// `DispatchError::Catalog` for an unregistered entity type.
    pub async fn update(
        &self,
        ctx: &AuditContext,
        entity_type: EntityType,
        id: &str,
        changes: &Row,
    ) -> Result<bool, DispatchError<E::Error>> {
        let schema = self.schema(entity_type)?;
        let before = if self.enabled {
            self.snapshot_for_audit(schema, id, "before").await
        } else {
            None
        };

        let matched = self
            .entities
            .update(schema, id, changes)
            .await
            .map_err(DispatchError::Store)?;

        if !matched {
            return Ok(false);
        }
        let Some(before) = before else {
            return Ok(true);
        };
        if let Some(after) = self.snapshot_for_audit(schema, id, "after").await {
            let diff = ChangeSet::for_update(schema, &before, &after);
            self.enqueue(ctx, entity_type, id, ChangeType::Update, &diff);
        }
        Ok(true)
    }

    /// Delete a row and write its deletion record before returning.
    ///
    /// A record is written only when a row was actually removed. A failed
    /// audit write is logged; the delete still reports success.
    ///
    /// # Errors
    ///
    /// Returns the entity store's error when the delete fails, or
    /// `DispatchError::Catalog` for an unregistered entity type.
    pub async fn delete(
        &self,
        ctx: &AuditContext,
        entity_type: EntityType,
        id: &str,
    ) -> Result<bool, DispatchError<E::Error>> {
        let schema = self.schema(entity_type)?;
        let before = if self.enabled {
            self.snapshot_for_audit(schema, id, "before").await
        } else {
            None
        };

        let removed = self
            .entities
            .delete(schema, id)
            .await
            .map_err(DispatchError::Store)?;

        if !removed {
            debug!(entity_type = %entity_type, id, "delete matched no row; no audit");
            return Ok(false);
        }
        let Some(before) = before else {
            return Ok(true);
        };

        let diff = ChangeSet::for_delete(schema, &before);
        let Some(payload) = self
            .builder
            .build(entity_type, id, ChangeType::Delete, &diff, ctx)
        else {
            return Ok(true);
        };
        match self.audit_store.create_record(&payload).await {
            Ok(record) => debug!(
                audit_id = %record.id,
                entity_type = %entity_type,
                id,
                version = record.version,
                "deletion audit written"
            ),
            Err(e) => {
                let body = serde_json::to_string(&payload).unwrap_or_default();
                error!(
                    error = %e,
                    entity_type = %entity_type,
                    id,
                    payload = %body,
                    "deletion audit write failed; payload discarded"
                );
            }
        }
        Ok(true)
    }

    async fn snapshot_for_audit(&self, schema: &EntitySchema, id: &str, phase: &str) -> Option<Row> {
        match self.entities.snapshot(schema, id).await {
            Ok(Some(row)) => Some(row),
            Ok(None) => {
                debug!(entity_type = %schema.entity_type, id, phase, "no row to snapshot");
                None
            }
            Err(e) => {
                warn!(
                    error = %e,
                    entity_type = %schema.entity_type,
                    id,
                    phase,
                    "snapshot failed; audit skipped"
                );
                None
            }
        }
    }

    fn enqueue(
        &self,
        ctx: &AuditContext,
        entity_type: EntityType,
        id: &str,
        change_type: ChangeType,
        changes: &ChangeSet,
    ) {
        debug_assert!(change_type.is_async(), "{change_type} is audited synchronously");
        if let Some(payload) = self.builder.build(entity_type, id, change_type, changes, ctx) {
            self.sink.enqueue(payload);
        }
    }
}
