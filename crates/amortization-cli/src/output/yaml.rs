use serde_json::Value;

/// Print the envelope as a YAML document to stdout.
pub fn print_yaml(value: &Value) {
    match serde_yaml::to_string(value) {
        Ok(s) => print!("{}", s),
        Err(e) => eprintln!("YAML serialization error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn test_money_strings_stay_quoted() {
        let value = json!({"result": {"installment": "32282.53", "periods_used": 240}});
        let text = serde_yaml::to_string(&value).unwrap();
        assert!(text.contains("installment: '32282.53'"), "{text}");
        assert!(text.contains("periods_used: 240"), "{text}");
    }
}
