use anyhow::Context;
use mise_core::row::Row;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse `column=value` assignments into a row.
///
/// Values are read as JSON when they parse (`42`, `true`, `null`,
/// `{"a":1}`, `"quoted"`) and as plain strings otherwise. Later assignments
/// to the same column win.
pub fn parse_assignments(assignments: &[String]) -> anyhow::Result<Row> {
    let mut row = Row::new();
    for assignment in assignments {
        let (column, raw) = assignment
            .split_once('=')
            .with_context(|| format!("invalid --set '{assignment}': expected COLUMN=VALUE"))?;
        let column = column.trim();
        if column.is_empty() {
            anyhow::bail!("invalid --set '{assignment}': empty column name");
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        row.insert(column.to_string(), value);
    }
    Ok(row)
}
