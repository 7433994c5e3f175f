//! # mise-schema
//!
//! JSON Schema registry for Mise.
//!
//! Types are defined in `mise-core` with `#[derive(JsonSchema)]`. This crate
//! compiles their schemas once and validates arbitrary JSON against them.
//! The audit sink uses it to reject malformed payloads before they reach
//! the audit store.

mod error;
mod registry;

pub use error::SchemaError;
pub use registry::{AUDIT_PAYLOAD, AUDIT_RECORD, SchemaRegistry};
