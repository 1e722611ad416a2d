use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{format_scalar, record_columns, result_section};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_csv(&mut wtr, value) {
        eprintln!("CSV error: {}", e);
    }
}

/// Schedules and yearly summaries become one line per record; anything
/// else becomes a two-column field/value listing.
fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match result_section(value) {
        Value::Object(result) => {
            if let Some(records) = first_record_array(result) {
                write_array_csv(wtr, records)?;
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in result {
                    wtr.write_record([key.as_str(), &format_scalar(val)])?;
                }
            }
        }
        Value::Array(arr) => write_array_csv(wtr, arr)?,
        other => wtr.write_record([format_scalar(other)])?,
    }
    wtr.flush()?;
    Ok(())
}

fn first_record_array(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.values().find_map(|v| match v {
        Value::Array(arr) if arr.first().is_some_and(Value::is_object) => Some(arr),
        _ => None,
    })
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    if let Some(Value::Object(first)) = arr.first() {
        let headers = record_columns(first);
        wtr.write_record(&headers)?;

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
    } else {
        for item in arr {
            wtr.write_record([format_scalar(item)])?;
        }
    }
    Ok(())
}
