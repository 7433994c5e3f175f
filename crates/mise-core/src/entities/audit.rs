use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::change_set::ChangeSet;
use crate::enums::{ChangeType, EntityType};

/// Durable, immutable record of one entity mutation.
///
/// Created once per successful mutation with a non-empty change set and
/// never updated afterwards. `version` increases monotonically per
/// `(record_type, record_id)` and is assigned by the audit store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AuditRecord {
    pub id: String,
    pub record_type: EntityType,
    pub record_id: String,
    pub user_id: Option<String>,
    pub change_type: ChangeType,
    pub version: u32,
    #[schemars(with = "BTreeMap<String, [serde_json::Value; 2]>")]
    pub record_changes: ChangeSet,
    pub changed_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}
