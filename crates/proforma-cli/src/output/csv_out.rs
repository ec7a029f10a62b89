use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// Arrays of objects become a header row plus one record per element, in
/// the field order of the first element. Objects become field/value pairs.
/// Use `--section` to export one schedule table directly.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let written = match body {
        Value::Array(rows) => write_rows(&mut wtr, rows),
        Value::Object(map) => write_fields(&mut wtr, map),
        other => wtr.write_record([format_csv_value(other)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {e}");
    }
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;

    for map in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_csv(rows: &[Value]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rows(&mut wtr, rows).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_keep_field_order() {
        let rows = vec![
            json!({"period": 1, "date": "2016-01-01", "ending_balance": "99855.91"}),
            json!({"period": 2, "date": "2016-02-01", "ending_balance": "99711.34"}),
        ];
        let out = to_csv(&rows);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("period,date,ending_balance"));
        assert_eq!(lines.next(), Some("1,2016-01-01,99855.91"));
    }

    #[test]
    fn test_empty_rows_write_nothing() {
        assert_eq!(to_csv(&[]), "");
    }
}
