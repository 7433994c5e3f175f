//! Audit payload envelope.
//!
//! The `AuditPayload` is what the change-record builder produces and what the
//! async sink carries to its workers. It is flat and self-describing: plain
//! strings, enums and JSON, no references into live entity objects.
//!
//! The `v` field versions the payload shape: payloads without a `v` field
//! deserialize with `v == 1` via `#[serde(default)]`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::change_set::ChangeSet;
use crate::enums::{ChangeType, EntityType};

/// Current payload schema version.
pub const PAYLOAD_VERSION: u32 = 1;

const fn default_payload_version() -> u32 {
    PAYLOAD_VERSION
}

/// One audit record waiting to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AuditPayload {
    /// Schema version. Defaults to 1 when absent.
    #[serde(default = "default_payload_version")]
    pub v: u32,

    /// Kind of the audited entity.
    pub entity_type: EntityType,

    /// Id of the audited entity.
    pub entity_id: String,

    /// Acting principal, if any.
    pub actor_id: Option<String>,

    pub change_type: ChangeType,

    /// Keys of `field_diffs`, in order.
    #[schemars(length(min = 1))]
    pub changed_fields: Vec<String>,

    /// Redacted field diffs: `{"field": [old, new]}`.
    #[schemars(with = "BTreeMap<String, [serde_json::Value; 2]>")]
    pub field_diffs: ChangeSet,

    /// When the mutation was observed.
    pub captured_at: DateTime<Utc>,
}

impl AuditPayload {
    /// Whether `changed_fields` lists exactly the keys of `field_diffs`, in order.
    #[must_use]
    pub fn fields_consistent(&self) -> bool {
        self.changed_fields.len() == self.field_diffs.len()
            && self
                .changed_fields
                .iter()
                .zip(self.field_diffs.iter())
                .all(|(name, change)| *name == change.field)
    }
}
