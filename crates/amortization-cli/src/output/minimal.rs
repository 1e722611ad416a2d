use serde_json::Value;

use super::{format_scalar, result_section};

/// Headline fields, most specific first: a comparison answers with the
/// interest saved, everything else with the installment.
const PRIORITY_KEYS: [&str; 4] = [
    "interest_saved",
    "installment",
    "total_interest",
    "periods_used",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let result_obj = result_section(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_scalar(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_scalar(val));
        }
    }

    // Yearly summaries answer with the number of loan years.
    if let Value::Array(arr) = result_obj {
        return arr.len().to_string();
    }

    format_scalar(result_obj)
}
