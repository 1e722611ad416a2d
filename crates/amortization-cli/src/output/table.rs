use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, record_columns};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into a Field/Value table; each array of records
/// (schedule rows, yearly buckets) gets its own table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            print_flat_object(res_map);
            for (key, val) in res_map {
                if let Value::Array(records) = val {
                    println!("\n{}:", key);
                    print_array_table(records);
                }
            }
        }
        Value::Array(records) => print_array_table(records),
        other => println!("{}", format_scalar(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    println!("{}", field_value_table(map));
}

/// Two-column table of every non-array field.
fn field_value_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if !val.is_array() {
            builder.push_record([key.as_str(), &format_scalar(val)]);
        }
    }
    builder.build()
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }
    println!("{}", records_table(arr));
}

/// One row per record, columns taken from the first record's keys with
/// the period or year leading.
fn records_table(arr: &[Value]) -> Table {
    let mut builder = Builder::default();

    if let Some(Value::Object(first)) = arr.first() {
        let headers = record_columns(first);
        builder.push_record(headers.iter().copied());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
    } else {
        for item in arr {
            builder.push_record([format_scalar(item)]);
        }
    }

    builder.build()
}
