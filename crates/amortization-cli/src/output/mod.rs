pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod money;
pub mod table;
pub mod yaml;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Column order for schedule rows and yearly buckets. Keys not listed
/// follow in alphabetical order.
const LEADING_COLUMNS: [&str; 11] = [
    "period",
    "year",
    "months",
    "interest",
    "principal",
    "extra_payment",
    "total_payment",
    "remaining_balance",
    "principal_paid",
    "interest_paid",
    "closing_balance",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Yaml => yaml::print_yaml(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` section of a computation envelope, or the value itself.
pub(crate) fn result_section(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Render a scalar for a table cell or CSV field.
pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Column headers for a list of records, taken from its first record.
pub(crate) fn record_columns(first: &Map<String, Value>) -> Vec<&str> {
    let mut columns: Vec<&str> = LEADING_COLUMNS
        .iter()
        .copied()
        .filter(|c| first.contains_key(*c))
        .collect();
    columns.extend(
        first
            .keys()
            .map(String::as_str)
            .filter(|k| !LEADING_COLUMNS.contains(k)),
    );
    columns
}
