//! Audit pipeline error types.
//!
//! These never reach the caller of a mutation. They classify consumer-side
//! failures for the log line that records a discarded payload.

use mise_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Payload could not be serialized for validation or logging.
    #[error("Payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Payload failed JSON Schema validation.
    #[error("Payload rejected by schema: {0}")]
    Schema(#[from] SchemaError),

    /// The audit store refused or failed the write.
    #[error("Audit store write failed: {0}")]
    Store(String),
}
