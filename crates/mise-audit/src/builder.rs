//! Change-record builder.
//!
//! Turns a change set into the flat `AuditPayload` handed to the sink (or,
//! for deletes, straight to the audit store).

use std::sync::Arc;

use chrono::Utc;
use mise_core::change_set::ChangeSet;
use mise_core::context::AuditContext;
use mise_core::enums::{ChangeType, EntityType};
use mise_core::payload::{AuditPayload, PAYLOAD_VERSION};
use tracing::debug;

use crate::redact::{RedactionPolicy, redact};

#[derive(Debug, Clone)]
pub struct ChangeRecordBuilder {
    policy: Arc<RedactionPolicy>,
}

impl ChangeRecordBuilder {
    #[must_use]
    pub fn new(policy: Arc<RedactionPolicy>) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Build the payload for one mutation.
    ///
    /// Returns `None` when the change set is empty: a save that changed
    /// nothing produces no audit record. `entity_id` is the post-mutation id
    /// for creates and the pre-mutation id for updates and deletes.
    #[must_use]
    pub fn build(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        change_type: ChangeType,
        changes: &ChangeSet,
        ctx: &AuditContext,
    ) -> Option<AuditPayload> {
        if changes.is_empty() {
            debug!(
                entity_type = %entity_type,
                entity_id,
                change_type = %change_type,
                request_id = ctx.request_id.as_deref(),
                "no field changes; audit suppressed"
            );
            return None;
        }

        let field_diffs = redact(changes, &self.policy);
        debug!(
            entity_type = %entity_type,
            entity_id,
            change_type = %change_type,
            fields = field_diffs.len(),
            request_id = ctx.request_id.as_deref(),
            "audit payload built"
        );
        Some(AuditPayload {
            v: PAYLOAD_VERSION,
            entity_type,
            entity_id: entity_id.to_string(),
            actor_id: ctx.actor_id.clone(),
            change_type,
            changed_fields: field_diffs.fields(),
            field_diffs,
            captured_at: Utc::now(),
        })
    }
}

impl Default for ChangeRecordBuilder {
    fn default() -> Self {
        Self::new(Arc::new(RedactionPolicy::builtin()))
    }
}
