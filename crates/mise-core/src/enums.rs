//! Entity types and change types for Mise.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! The string forms double as the values stored in the `audit_records` table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Kind of auditable business entity. Stored as `record_type` on audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Restaurant,
    Reservation,
    MenuCategory,
    Dish,
    Ingredient,
    Allergen,
    Tag,
    Setting,
    Preference,
    Image,
}

impl EntityType {
    /// Every entity type, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::User,
        Self::Restaurant,
        Self::Reservation,
        Self::MenuCategory,
        Self::Dish,
        Self::Ingredient,
        Self::Allergen,
        Self::Tag,
        Self::Setting,
        Self::Preference,
        Self::Image,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Restaurant => "restaurant",
            Self::Reservation => "reservation",
            Self::MenuCategory => "menu_category",
            Self::Dish => "dish",
            Self::Ingredient => "ingredient",
            Self::Allergen => "allergen",
            Self::Tag => "tag",
            Self::Setting => "setting",
            Self::Preference => "preference",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChangeType
// ---------------------------------------------------------------------------

/// The lifecycle transition an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl ChangeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether records of this type go through the async sink.
    ///
    /// Deletes are written synchronously on a separate path.
    #[must_use]
    pub const fn is_async(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
