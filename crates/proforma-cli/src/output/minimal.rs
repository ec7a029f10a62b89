use serde_json::Value;

/// Key figures in priority order. Searched in the result object and in
/// its nested summary objects (`stats`, `summary`).
const PRIORITY_KEYS: [&str; 6] = [
    "total_lease_value",
    "payment",
    "total_interest",
    "total_expenses",
    "years_rent",
    "months_rent",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            if let Some(val) = find_priority(map) {
                println!("{}", format_minimal(val));
                return;
            }
            // Rent roll and similar: report table sizes instead of dumping rows
            for (key, val) in map {
                match val {
                    Value::Array(rows) => println!("{key}: {} rows", rows.len()),
                    other => println!("{key}: {}", format_minimal(other)),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let line = item
                    .as_object()
                    .and_then(find_priority)
                    .map(format_minimal)
                    .unwrap_or_else(|| format_minimal(item));
                println!("{line}");
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

fn find_priority(map: &serde_json::Map<String, Value>) -> Option<&Value> {
    for key in &PRIORITY_KEYS {
        if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
            return Some(val);
        }
        for nested in map.values().filter_map(Value::as_object) {
            if let Some(val) = nested.get(*key).filter(|v| !v.is_null()) {
                return Some(val);
            }
        }
    }
    None
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
