//! ID prefix constants.
//!
//! Every persisted row gets a prefixed id such as `usr-a3f8b2c1`: the prefix
//! followed by a dash and eight lowercase hex characters.

use crate::enums::EntityType;

pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_USER: &str = "usr";
pub const PREFIX_RESTAURANT: &str = "rst";
pub const PREFIX_RESERVATION: &str = "rsv";
pub const PREFIX_MENU_CATEGORY: &str = "cat";
pub const PREFIX_DISH: &str = "dsh";
pub const PREFIX_INGREDIENT: &str = "ing";
pub const PREFIX_ALLERGEN: &str = "alg";
pub const PREFIX_TAG: &str = "tag";
pub const PREFIX_SETTING: &str = "set";
pub const PREFIX_PREFERENCE: &str = "prf";
pub const PREFIX_IMAGE: &str = "img";

/// Prefix of per-invocation correlation ids. These only appear in logs.
pub const PREFIX_REQUEST: &str = "req";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_AUDIT,
    PREFIX_USER,
    PREFIX_RESTAURANT,
    PREFIX_RESERVATION,
    PREFIX_MENU_CATEGORY,
    PREFIX_DISH,
    PREFIX_INGREDIENT,
    PREFIX_ALLERGEN,
    PREFIX_TAG,
    PREFIX_SETTING,
    PREFIX_PREFERENCE,
    PREFIX_IMAGE,
];

/// Id prefix for rows of the given entity type.
#[must_use]
pub const fn prefix_for(entity: EntityType) -> &'static str {
    match entity {
        EntityType::User => PREFIX_USER,
        EntityType::Restaurant => PREFIX_RESTAURANT,
        EntityType::Reservation => PREFIX_RESERVATION,
        EntityType::MenuCategory => PREFIX_MENU_CATEGORY,
        EntityType::Dish => PREFIX_DISH,
        EntityType::Ingredient => PREFIX_INGREDIENT,
        EntityType::Allergen => PREFIX_ALLERGEN,
        EntityType::Tag => PREFIX_TAG,
        EntityType::Setting => PREFIX_SETTING,
        EntityType::Preference => PREFIX_PREFERENCE,
        EntityType::Image => PREFIX_IMAGE,
    }
}
