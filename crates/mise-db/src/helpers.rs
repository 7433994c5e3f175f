//! Row parsing and value conversion helpers.
//!
//! Repos read `libsql::Row` by column index. These helpers isolate the
//! parsing logic, the dual datetime format (`SQLite`'s `datetime('now')` vs
//! Rust's `to_rfc3339()`), and the JSON ⇄ libSQL conversion driven by each
//! catalog column's [`ColumnKind`].

use chrono::{DateTime, Utc};
use mise_core::catalog::{Column, ColumnKind};
use mise_core::errors::CoreError;
use serde_json::Value;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all mise-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Deserialize a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not valid JSON for `T`.
pub fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Quote an identifier from the static catalog for use in SQL text.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

fn type_mismatch(table: &str, column: &Column, value: &Value) -> DatabaseError {
    CoreError::Validation(format!(
        "{table}.{}: expected {:?}, got {value}",
        column.name, column.kind
    ))
    .into()
}

/// Convert a JSON value into the libSQL value stored for `column`.
///
/// `null` is always accepted. Booleans are stored as 0/1, JSON columns as
/// their serialized text, timestamps as validated text.
///
/// # Errors
///
/// Returns `DatabaseError::Invalid` when the value's JSON type does not fit
/// the column.
pub fn json_to_sql(table: &str, column: &Column, value: &Value) -> Result<libsql::Value, DatabaseError> {
    if value.is_null() {
        return Ok(libsql::Value::Null);
    }
    let converted = match column.kind {
        ColumnKind::Text => value.as_str().map(|s| libsql::Value::Text(s.to_string())),
        ColumnKind::Integer => value.as_i64().map(libsql::Value::Integer),
        ColumnKind::Real => value.as_f64().map(libsql::Value::Real),
        ColumnKind::Boolean => value.as_bool().map(|b| libsql::Value::Integer(i64::from(b))),
        ColumnKind::Json => Some(libsql::Value::Text(value.to_string())),
        ColumnKind::Timestamp => match value.as_str() {
            Some(s) => {
                parse_datetime(s)?;
                Some(libsql::Value::Text(s.to_string()))
            }
            None => None,
        },
    };
    converted.ok_or_else(|| type_mismatch(table, column, value))
}

/// Convert a stored libSQL value back into JSON for `column`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` for a JSON column holding invalid JSON or
/// a storage class the column never produces.
pub fn sql_to_json(column: &Column, value: libsql::Value) -> Result<Value, DatabaseError> {
    let json = match (column.kind, value) {
        (_, libsql::Value::Null) => Value::Null,
        (ColumnKind::Boolean, libsql::Value::Integer(n)) => Value::Bool(n != 0),
        (ColumnKind::Json, libsql::Value::Text(s)) => parse_json(&s)?,
        (_, libsql::Value::Integer(n)) => Value::from(n),
        (_, libsql::Value::Real(f)) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        (_, libsql::Value::Text(s)) => Value::String(s),
        (_, libsql::Value::Blob(_)) => {
            return Err(DatabaseError::Query(format!(
                "Unexpected BLOB in column {}",
                column.name
            )));
        }
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use mise_core::enums::EntityType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_datetime_rfc3339() {
        let dt = parse_datetime("2026-02-09T14:30:00+00:00").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn parse_datetime_sqlite_format() {
        let dt = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(dt.month(), 2);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn parse_datetime_invalid() {
        assert!(parse_datetime("not-a-date").is_err());
    }

    #[test]
    fn parse_enum_entity_type() {
        let et: EntityType = parse_enum("menu_category").unwrap();
        assert_eq!(et, EntityType::MenuCategory);
        assert!(parse_enum::<EntityType>("spaceship").is_err());
    }

    #[rstest]
    #[case(Column::text("name"), json!("Soup"), libsql::Value::Text("Soup".into()))]
    #[case(Column::integer("people"), json!(4), libsql::Value::Integer(4))]
    #[case(Column::real("price"), json!(9.5), libsql::Value::Real(9.5))]
    #[case(Column::boolean("active"), json!(true), libsql::Value::Integer(1))]
    #[case(Column::json("value"), json!({"a": 1}), libsql::Value::Text("{\"a\":1}".into()))]
    #[case(Column::text("name"), json!(null), libsql::Value::Null)]
    fn json_to_sql_by_kind(#[case] column: Column, #[case] input: Value, #[case] want: libsql::Value) {
        assert_eq!(json_to_sql("t", &column, &input).unwrap(), want);
    }

    #[rstest]
    #[case(Column::text("name"), json!(5))]
    #[case(Column::integer("people"), json!("four"))]
    #[case(Column::boolean("active"), json!(1))]
    #[case(Column::timestamp("created_at"), json!("yesterday"))]
    fn json_to_sql_rejects_mismatches(#[case] column: Column, #[case] input: Value) {
        assert!(matches!(
            json_to_sql("t", &column, &input),
            Err(DatabaseError::Invalid(_) | DatabaseError::Query(_))
        ));
    }

    #[rstest]
    #[case(Column::boolean("active"), libsql::Value::Integer(0), json!(false))]
    #[case(Column::json("value"), libsql::Value::Text("[1,2]".into()), json!([1, 2]))]
    #[case(Column::integer("people"), libsql::Value::Integer(2), json!(2))]
    #[case(Column::text("name"), libsql::Value::Null, json!(null))]
    fn sql_to_json_by_kind(#[case] column: Column, #[case] input: libsql::Value, #[case] want: Value) {
        assert_eq!(sql_to_json(&column, input).unwrap(), want);
    }
}
