use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables. Scalar result fields share one Field/Value
/// table; each nested summary object and each array of rows gets its own
/// titled table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_object(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{value}"),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        Value::Array(rows) => print_rows(rows),
        other => println!("{other}"),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut scalars = Builder::default();
    scalars.push_record(["Field", "Value"]);
    let mut has_scalars = false;
    let mut sections: Vec<(&str, &Value)> = Vec::new();

    for (key, val) in map {
        match val {
            Value::Object(_) | Value::Array(_) => sections.push((key.as_str(), val)),
            _ => {
                scalars.push_record([key.as_str(), &format_value(val)]);
                has_scalars = true;
            }
        }
    }

    if has_scalars {
        println!("{}", Table::from(scalars));
    }

    for (title, val) in sections {
        println!("\n{title}:");
        match val {
            Value::Object(nested) => print_field_values(nested),
            Value::Array(rows) => print_rows(rows),
            _ => {}
        }
    }
}

fn print_field_values(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    let Some(first) = arr.first() else {
        println!("(empty)");
        return;
    };

    let Value::Object(first) = first else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }

    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
