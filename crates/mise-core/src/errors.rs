//! Cross-cutting error types for Mise.
//!
//! Domain-specific errors (`DatabaseError`, `AuditError`, `ConfigError`) live in
//! their respective crates. `CoreError` covers catalog lookups and row
//! validation, which every layer above the core shares.

use thiserror::Error;

/// Errors that can be raised by any Mise crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity type has no schema registered in the catalog.
    #[error("Entity type not registered in catalog: {0}")]
    UnknownEntity(String),

    /// A row referenced a column the entity does not declare.
    #[error("Unknown column '{column}' for entity {entity_type}")]
    UnknownColumn { entity_type: String, column: String },

    /// Data failed validation (schema, format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::{EntityCatalog, TAG};
    use crate::enums::EntityType;

    #[test]
    fn missing_catalog_entry_is_unknown_entity() {
        let catalog = EntityCatalog::new().with(TAG).unwrap();
        let err = catalog.get(EntityType::Dish).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEntity(ref name) if name == "dish"));
        assert_eq!(err.to_string(), "Entity type not registered in catalog: dish");
    }

    #[test]
    fn unknown_column_names_entity_and_column() {
        let err = CoreError::UnknownColumn {
            entity_type: "tag".into(),
            column: "calories".into(),
        };
        assert_eq!(err.to_string(), "Unknown column 'calories' for entity tag");
    }
}
