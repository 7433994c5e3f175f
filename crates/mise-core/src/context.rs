//! Explicit per-request audit context.
//!
//! The acting principal travels with the call instead of living in process
//! globals. Each request or task builds one `AuditContext` and passes it to
//! the lifecycle dispatcher.

use serde::{Deserialize, Serialize};

/// Who caused a mutation, valid for the duration of one request or task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Acting user id. `None` for system-initiated changes.
    pub actor_id: Option<String>,
    /// Correlation id for log lines. Not persisted.
    pub request_id: Option<String>,
}

impl AuditContext {
    /// Context for a change made on behalf of a user.
    #[must_use]
    pub fn for_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            request_id: None,
        }
    }

    /// Context for a system-initiated change (no actor).
    #[must_use]
    pub const fn system() -> Self {
        Self {
            actor_id: None,
            request_id: None,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
