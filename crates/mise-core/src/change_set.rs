//! Per-field old/new value pairs for one mutation.
//!
//! A `ChangeSet` is built only from fields that actually changed. It
//! serializes as a JSON object `{"field": [old, new], ...}` in field order,
//! which is the shape stored in `audit_records.record_changes`.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::catalog::EntitySchema;
use crate::row::Row;

/// One changed field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    #[must_use]
    pub fn new(field: impl Into<String>, old: Value, new: Value) -> Self {
        Self {
            field: field.into(),
            old,
            new,
        }
    }
}

/// Ordered field → `(old, new)` mapping. Field names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Changes produced by creating a row: every declared column whose value
    /// differs from the column default (`null`), as `(null, new)`.
    #[must_use]
    pub fn for_create(schema: &EntitySchema, after: &Row) -> Self {
        schema
            .column_names()
            .filter_map(|name| match after.get(name) {
                Some(value) if !value.is_null() => {
                    Some(FieldChange::new(name, Value::Null, value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Changes produced by updating a row: only columns whose value differs
    /// between the two snapshots. Missing columns read as `null`.
    #[must_use]
    pub fn for_update(schema: &EntitySchema, before: &Row, after: &Row) -> Self {
        schema
            .column_names()
            .filter_map(|name| {
                let old = before.get(name).unwrap_or(&Value::Null);
                let new = after.get(name).unwrap_or(&Value::Null);
                (old != new).then(|| FieldChange::new(name, old.clone(), new.clone()))
            })
            .collect()
    }

    /// Changes produced by deleting a row: every non-null pre-mutation value
    /// as `(old, null)`.
    #[must_use]
    pub fn for_delete(schema: &EntitySchema, before: &Row) -> Self {
        schema
            .column_names()
            .filter_map(|name| match before.get(name) {
                Some(value) if !value.is_null() => {
                    Some(FieldChange::new(name, value.clone(), Value::Null))
                }
                _ => None,
            })
            .collect()
    }

    /// Insert a change, replacing any existing entry for the same field in place.
    pub fn insert(&mut self, change: FieldChange) {
        if let Some(existing) = self.changes.iter_mut().find(|c| c.field == change.field) {
            *existing = change;
        } else {
            self.changes.push(change);
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    /// Field names in order.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.field.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.changes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl FromIterator<FieldChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = FieldChange>>(iter: I) -> Self {
        let mut set = Self::new();
        for change in iter {
            set.insert(change);
        }
        set
    }
}

impl IntoIterator for ChangeSet {
    type Item = FieldChange;
    type IntoIter = std::vec::IntoIter<FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl Serialize for ChangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.changes.len()))?;
        for change in &self.changes {
            map.serialize_entry(&change.field, &(&change.old, &change.new))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChangeSetVisitor;

        impl<'de> Visitor<'de> for ChangeSetVisitor {
            type Value = ChangeSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to [old, new]")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ChangeSet, A::Error> {
                let mut set = ChangeSet::new();
                while let Some((field, (old, new))) = access.next_entry::<String, (Value, Value)>()? {
                    if set.get(&field).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate field '{field}' in change set"
                        )));
                    }
                    set.changes.push(FieldChange { field, old, new });
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ChangeSetVisitor)
    }
}
