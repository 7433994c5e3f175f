//! Column snapshots of a persisted entity.

use serde_json::Value;

/// Ordered mapping of column name to value.
///
/// Backed by `serde_json::Map` with `preserve_order`, so iteration follows
/// insertion order.
pub type Row = serde_json::Map<String, Value>;

/// Whether a value counts as blank.
///
/// Blank values are `null`, `false`, empty or whitespace-only strings, and
/// empty arrays or objects.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(null), true)]
    #[case(json!(false), true)]
    #[case(json!(""), true)]
    #[case(json!("   \t"), true)]
    #[case(json!([]), true)]
    #[case(json!({}), true)]
    #[case(json!(true), false)]
    #[case(json!(0), false)]
    #[case(json!("x"), false)]
    #[case(json!(["a"]), false)]
    #[case(json!({"k": 1}), false)]
    fn blankness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_blank(&value), expected);
    }
}
