pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;
use std::io::{self, Write};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    let mut out = io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|_| writeln!(out));
    if let Err(e) = written {
        eprintln!("Failed to write JSON: {e}");
    }
}

/// Pull one field out of the result envelope, looking first in `result`
/// and then one level deeper (e.g. `stats` inside a lease schedule).
pub fn select_section(value: Value, section: &str) -> Result<Value, String> {
    let result = match value {
        Value::Object(mut map) => map.remove("result").unwrap_or(Value::Object(map)),
        other => other,
    };

    if let Value::Object(map) = &result {
        if let Some(found) = map.get(section) {
            return Ok(found.clone());
        }
        for nested in map.values() {
            if let Some(found) = nested.as_object().and_then(|m| m.get(section)) {
                return Ok(found.clone());
            }
        }
        let available: Vec<&str> = map.keys().map(String::as_str).collect();
        return Err(format!(
            "Section '{}' not found (available: {})",
            section,
            available.join(", ")
        ));
    }

    Err(format!("Section '{section}' not found: result is not an object"))
}
