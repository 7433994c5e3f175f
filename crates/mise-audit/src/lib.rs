//! # mise-audit
//!
//! The model-change audit pipeline.
//!
//! ```text
//! entity mutation
//!   └─ LifecycleDispatcher (before/after snapshots)
//!        ├─ ChangeSet diff → ChangeRecordBuilder → redact()
//!        ├─ create/update → AuditSinkHandle::enqueue → mpsc → workers → AuditStore
//!        └─ delete        → AuditStore (synchronous)
//! ```
//!
//! Auditing never changes the outcome of the mutation it observes. Failures
//! inside the pipeline are logged through `tracing` and dropped; audit
//! writes are never retried.

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod redact;
pub mod sink;
pub mod store;

#[cfg(test)]
mod test_support;

pub use builder::ChangeRecordBuilder;
pub use dispatcher::{DispatchError, LifecycleDispatcher};
pub use error::AuditError;
pub use redact::{REDACTED, RedactionPolicy, redact};
pub use sink::{AuditSink, AuditSinkHandle, EnqueueOutcome, SinkOptions, SinkStats};
pub use store::{AuditStore, EntityStore};
