//! `mise-audit` persistence seams backed by libSQL.

use mise_audit::{AuditStore, EntityStore};
use mise_core::catalog::EntitySchema;
use mise_core::entities::AuditRecord;
use mise_core::payload::AuditPayload;
use mise_core::row::Row;

use crate::MiseDb;
use crate::error::DatabaseError;

impl EntityStore for MiseDb {
    type Error = DatabaseError;

    async fn snapshot(&self, schema: &EntitySchema, id: &str) -> Result<Option<Row>, Self::Error> {
        self.get_entity(schema, id).await
    }

    async fn insert(&self, schema: &EntitySchema, row: &Row) -> Result<String, Self::Error> {
        self.insert_entity(schema, row).await
    }

    async fn update(
        &self,
        schema: &EntitySchema,
        id: &str,
        changes: &Row,
    ) -> Result<bool, Self::Error> {
        self.update_entity(schema, id, changes).await
    }

    async fn delete(&self, schema: &EntitySchema, id: &str) -> Result<bool, Self::Error> {
        self.delete_entity(schema, id).await
    }
}

impl AuditStore for MiseDb {
    type Error = DatabaseError;

    async fn create_record(&self, payload: &AuditPayload) -> Result<AuditRecord, Self::Error> {
        self.insert_audit_record(payload).await
    }
}
