//! Seams to the persistence collaborators.
//!
//! `EntityStore` is the business-entity persistence layer whose mutations
//! are being audited. `AuditStore` persists finished audit records. Both
//! return `Send` futures so they can be driven from spawned worker tasks.

use std::future::Future;
use std::sync::Arc;

use mise_core::catalog::EntitySchema;
use mise_core::entities::AuditRecord;
use mise_core::payload::AuditPayload;
use mise_core::row::Row;

/// Persistence for auditable entities.
pub trait EntityStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current column values of a row, or `None` if it does not exist.
    fn snapshot(
        &self,
        schema: &EntitySchema,
        id: &str,
    ) -> impl Future<Output = Result<Option<Row>, Self::Error>> + Send;

    /// Insert a row and return its new id.
    fn insert(
        &self,
        schema: &EntitySchema,
        row: &Row,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Apply column changes. Returns `false` when no row matched `id`.
    fn update(
        &self,
        schema: &EntitySchema,
        id: &str,
        changes: &Row,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Delete a row. Returns `true` only when a row was actually removed.
    fn delete(
        &self,
        schema: &EntitySchema,
        id: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Durable store for audit records.
pub trait AuditStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist one payload as an immutable audit record, assigning its
    /// per-entity version. May reject payloads that break store invariants.
    fn create_record(
        &self,
        payload: &AuditPayload,
    ) -> impl Future<Output = Result<AuditRecord, Self::Error>> + Send;
}

impl<T: EntityStore> EntityStore for Arc<T> {
    type Error = T::Error;

    fn snapshot(
        &self,
        schema: &EntitySchema,
        id: &str,
    ) -> impl Future<Output = Result<Option<Row>, Self::Error>> + Send {
        (**self).snapshot(schema, id)
    }

    fn insert(
        &self,
        schema: &EntitySchema,
        row: &Row,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send {
        (**self).insert(schema, row)
    }

    fn update(
        &self,
        schema: &EntitySchema,
        id: &str,
        changes: &Row,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        (**self).update(schema, id, changes)
    }

    fn delete(
        &self,
        schema: &EntitySchema,
        id: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        (**self).delete(schema, id)
    }
}
