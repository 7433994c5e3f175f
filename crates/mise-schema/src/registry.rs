//! Central schema registry.
//!
//! The `SchemaRegistry` builds JSON Schemas from mise-core types at
//! construction time using [`schemars::schema_for!`] and compiles one
//! `jsonschema` validator per schema, so validation on the hot path does no
//! compilation work.

use std::collections::HashMap;

use schemars::schema_for;

use crate::error::SchemaError;

/// Registry name of the [`mise_core::payload::AuditPayload`] schema.
pub const AUDIT_PAYLOAD: &str = "audit_payload";
/// Registry name of the [`mise_core::entities::AuditRecord`] schema.
pub const AUDIT_RECORD: &str = "audit_record";

struct Entry {
    schema: serde_json::Value,
    validator: jsonschema::Validator,
}

/// Compiled JSON Schemas for every type that crosses a serialization boundary.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, Entry>,
}

/// Generate, compile and insert a schema. Panics if `schemars` output fails
/// to serialize or compile, which only happens on a programming error.
macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {{
        let schema = serde_json::to_value(schema_for!($ty)).unwrap();
        let validator = jsonschema::validator_for(&schema).unwrap();
        $map.insert($name, Entry { schema, validator });
    }};
}

impl SchemaRegistry {
    /// Build a registry containing the audit payload and audit record schemas.
    ///
    /// # Panics
    ///
    /// Panics if a `schemars`-generated schema cannot be serialized or
    /// compiled. Not expected in practice.
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        register!(schemas, AUDIT_PAYLOAD, mise_core::payload::AuditPayload);
        register!(schemas, AUDIT_RECORD, mise_core::entities::AuditRecord);
        Self { schemas }
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name).map(|e| &e.schema)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown, or
    /// `SchemaError::ValidationFailed` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), SchemaError> {
        let entry = self
            .schemas
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;

        let errors: Vec<String> = entry
            .validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { errors })
        }
    }

    /// List all registered schema names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
