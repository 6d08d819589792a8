use serde_json::Value;
use std::io;

use super::scalar;

/// CSV export. The decision trail is the natural tabular payload; a document
/// without one degrades to key,value lines of its scalar fields.
pub fn print_csv(value: &Value) {
    let body = value.get("result").unwrap_or(value);

    if let Some(Value::Array(steps)) = body.get("waterfall_data") {
        if steps.iter().all(Value::is_object) && !steps.is_empty() {
            write_rows(steps);
            return;
        }
    }
    if let Some(Value::Array(rows)) = body.get("yearly_dscr") {
        if rows.iter().all(Value::is_object) && !rows.is_empty() {
            write_rows(rows);
            return;
        }
    }

    write_scalars(body);
}

fn write_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut writer = csv::Writer::from_writer(io::stdout());
    let _ = writer.write_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default())
                .collect();
            let _ = writer.write_record(&record);
        }
    }
    let _ = writer.flush();
}

fn write_scalars(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", value);
        return;
    };
    let mut writer = csv::Writer::from_writer(io::stdout());
    let _ = writer.write_record(["field", "value"]);
    for (key, val) in map {
        if !matches!(val, Value::Array(_) | Value::Object(_)) {
            let _ = writer.write_record([key.as_str(), &scalar(val)]);
        }
    }
    let _ = writer.flush();
}
