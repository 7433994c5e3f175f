//! Statically declared entity schemas.
//!
//! Each auditable entity type declares its table and columns up front. The
//! `EntityCatalog` is assembled once at startup from these declarations and
//! shared read-only afterwards; nothing inspects the database to discover
//! columns at runtime.

use std::collections::BTreeMap;

use crate::enums::EntityType;
use crate::errors::CoreError;
use crate::row::Row;

/// Storage kind of a column. Drives value conversion in the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    /// Arbitrary JSON stored as TEXT.
    Json,
    /// RFC 3339 timestamp stored as TEXT.
    Timestamp,
}

/// A single declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    #[must_use]
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }

    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    #[must_use]
    pub const fn real(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Real)
    }

    #[must_use]
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    #[must_use]
    pub const fn json(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Json)
    }

    #[must_use]
    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Timestamp)
    }
}

/// Declared shape of one entity type.
///
/// `columns` excludes the `id` primary key, which every table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    pub entity_type: EntityType,
    pub table: &'static str,
    pub columns: &'static [Column],
}

impl EntitySchema {
    /// Look up a declared column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Reject rows that mention columns this entity does not declare.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownColumn` for the first undeclared column.
    pub fn validate_row(&self, row: &Row) -> Result<(), CoreError> {
        match row.keys().find(|k| self.column(k).is_none()) {
            Some(column) => Err(CoreError::UnknownColumn {
                entity_type: self.entity_type.to_string(),
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Registry of every auditable entity's schema.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    schemas: BTreeMap<EntityType, EntitySchema>,
}

impl EntityCatalog {
    /// An empty catalog. Use [`EntityCatalog::builtin`] for the platform entities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog containing every restaurant platform entity.
    #[must_use]
    pub fn builtin() -> Self {
        let mut schemas = BTreeMap::new();
        for schema in BUILTIN_SCHEMAS {
            schemas.insert(schema.entity_type, *schema);
        }
        Self { schemas }
    }

    /// Register a schema.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the entity type is already registered
    /// or the schema declares the same column twice.
    pub fn register(&mut self, schema: EntitySchema) -> Result<(), CoreError> {
        if self.schemas.contains_key(&schema.entity_type) {
            return Err(CoreError::Validation(format!(
                "entity type '{}' registered twice",
                schema.entity_type
            )));
        }
        for (i, column) in schema.columns.iter().enumerate() {
            if column.name == "id" {
                return Err(CoreError::Validation(format!(
                    "entity type '{}' must not declare the 'id' column",
                    schema.entity_type
                )));
            }
            if schema.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(CoreError::Validation(format!(
                    "entity type '{}' declares column '{}' twice",
                    schema.entity_type, column.name
                )));
            }
        }
        self.schemas.insert(schema.entity_type, schema);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn with(mut self, schema: EntitySchema) -> Result<Self, CoreError> {
        self.register(schema)?;
        Ok(self)
    }

    /// Schema for an entity type.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownEntity` if the type was never registered.
    pub fn get(&self, entity: EntityType) -> Result<&EntitySchema, CoreError> {
        self.schemas
            .get(&entity)
            .ok_or_else(|| CoreError::UnknownEntity(entity.to_string()))
    }

    /// All registered schemas, ordered by entity type.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in restaurant entities
// ---------------------------------------------------------------------------

pub const USER: EntitySchema = EntitySchema {
    entity_type: EntityType::User,
    table: "users",
    columns: &[
        Column::text("name"),
        Column::text("surname"),
        Column::text("email"),
        Column::text("phone"),
        Column::text("password_digest"),
        Column::text("reset_password_token"),
        Column::boolean("admin"),
        Column::boolean("active"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const RESTAURANT: EntitySchema = EntitySchema {
    entity_type: EntityType::Restaurant,
    table: "restaurants",
    columns: &[
        Column::text("name"),
        Column::text("address"),
        Column::text("city"),
        Column::text("phone"),
        Column::text("email"),
        Column::text("website"),
        Column::integer("max_people"),
        Column::json("opening_hours"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const RESERVATION: EntitySchema = EntitySchema {
    entity_type: EntityType::Reservation,
    table: "reservations",
    columns: &[
        Column::text("fullname"),
        Column::text("email"),
        Column::text("phone"),
        Column::timestamp("datetime"),
        Column::integer("people"),
        Column::text("table_name"),
        Column::text("notes"),
        Column::text("status"),
        Column::text("secret"),
        Column::text("lang"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const MENU_CATEGORY: EntitySchema = EntitySchema {
    entity_type: EntityType::MenuCategory,
    table: "menu_categories",
    columns: &[
        Column::text("name"),
        Column::text("description"),
        Column::text("parent_id"),
        Column::boolean("visible"),
        Column::integer("position"),
        Column::real("price"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const DISH: EntitySchema = EntitySchema {
    entity_type: EntityType::Dish,
    table: "dishes",
    columns: &[
        Column::text("name"),
        Column::text("description"),
        Column::real("price"),
        Column::text("status"),
        Column::text("category_id"),
        Column::json("other_info"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const INGREDIENT: EntitySchema = EntitySchema {
    entity_type: EntityType::Ingredient,
    table: "ingredients",
    columns: &[
        Column::text("name"),
        Column::text("description"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const ALLERGEN: EntitySchema = EntitySchema {
    entity_type: EntityType::Allergen,
    table: "allergens",
    columns: &[
        Column::text("name"),
        Column::text("description"),
        Column::text("icon"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const TAG: EntitySchema = EntitySchema {
    entity_type: EntityType::Tag,
    table: "tags",
    columns: &[
        Column::text("name"),
        Column::text("color"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const SETTING: EntitySchema = EntitySchema {
    entity_type: EntityType::Setting,
    table: "settings",
    columns: &[
        Column::text("key"),
        Column::json("value"),
        Column::text("description"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const PREFERENCE: EntitySchema = EntitySchema {
    entity_type: EntityType::Preference,
    table: "preferences",
    columns: &[
        Column::text("user_id"),
        Column::text("key"),
        Column::json("value"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

pub const IMAGE: EntitySchema = EntitySchema {
    entity_type: EntityType::Image,
    table: "images",
    columns: &[
        Column::text("filename"),
        Column::text("content_type"),
        Column::integer("byte_size"),
        Column::text("record_type"),
        Column::text("record_id"),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
};

const BUILTIN_SCHEMAS: &[EntitySchema] = &[
    USER,
    RESTAURANT,
    RESERVATION,
    MENU_CATEGORY,
    DISH,
    INGREDIENT,
    ALLERGEN,
    TAG,
    SETTING,
    PREFERENCE,
    IMAGE,
];

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builtin_covers_every_entity_type() {
        let catalog = EntityCatalog::builtin();
        assert_eq!(catalog.len(), EntityType::ALL.len());
        for entity in EntityType::ALL {
            assert_eq!(catalog.get(entity).unwrap().entity_type, entity);
        }
    }

    #[test]
    fn builtin_schemas_pass_registration_checks() {
        let mut catalog = EntityCatalog::new();
        for schema in BUILTIN_SCHEMAS {
            catalog.register(*schema).unwrap();
        }
    }

    #[test]
    fn duplicate_registration_rejected() {
        let err = EntityCatalog::new().with(TAG).unwrap().with(TAG).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_column_rejected() {
        const BAD: EntitySchema = EntitySchema {
            entity_type: EntityType::Tag,
            table: "tags",
            columns: &[Column::text("name"), Column::text("name")],
        };
        assert!(EntityCatalog::new().with(BAD).is_err());
    }

    #[test]
    fn id_column_rejected() {
        const BAD: EntitySchema = EntitySchema {
            entity_type: EntityType::Tag,
            table: "tags",
            columns: &[Column::text("id")],
        };
        assert!(EntityCatalog::new().with(BAD).is_err());
    }

    #[test]
    fn unknown_entity_lookup_fails() {
        let err = EntityCatalog::new().get(EntityType::Dish).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEntity(ref e) if e == "dish"));
    }

    #[test]
    fn validate_row_flags_unknown_columns() {
        let mut row = Row::new();
        row.insert("name".into(), json!("Gluten"));
        assert!(ALLERGEN.validate_row(&row).is_ok());

        row.insert("calories".into(), json!(12));
        let err = ALLERGEN.validate_row(&row).unwrap_err();
        assert!(matches!(err, CoreError::UnknownColumn { ref column, .. } if column == "calories"));
    }

    #[test]
    fn column_names_keep_declaration_order() {
        let names: Vec<_> = TAG.column_names().collect();
        assert_eq!(names, ["name", "color", "created_at", "updated_at"]);
    }
}
