//! Persisted entity structs.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and schema validation.

mod audit;

pub use audit::AuditRecord;
