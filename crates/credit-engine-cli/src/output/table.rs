use serde_json::Value;
use tabled::builder::Builder;
use tabled::Table;

use super::scalar;

/// Sections rendered as their own row tables when present in a document.
const ROW_SECTIONS: &[&str] = &["waterfall_data", "yearly_dscr", "chart_data", "entries"];

/// Note lists appended after the tables.
const NOTE_SECTIONS: &[&str] = &["flags", "compliance_notes", "rejection_reasons"];

/// Render a result document as tables: scalar fields first, nested objects
/// as their own field tables, then the trail/DSCR row sections, then notes.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_document(result);
                print_notes("Warnings", map.get("warnings"));
                if let Some(Value::String(methodology)) = map.get("methodology") {
                    println!("\nMethodology: {}", methodology);
                }
            } else {
                print_document(value);
            }
        }
        _ => println!("{}", value),
    }
}

fn print_document(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if !matches!(val, Value::Array(_) | Value::Object(_)) {
            builder.push_record([key.as_str(), &scalar(val)]);
        }
    }
    println!("{}", Table::from(builder));

    for (key, val) in map {
        if let Value::Object(nested) = val {
            print_nested_object(key, nested);
        }
    }

    for section in ROW_SECTIONS {
        if let Some(Value::Array(rows)) = map.get(*section) {
            if rows.iter().all(Value::is_object) && !rows.is_empty() {
                println!("\n{}:", section);
                print_rows(rows);
            }
        }
    }

    for section in NOTE_SECTIONS {
        print_notes(section, map.get(*section));
    }
}

fn print_nested_object(name: &str, nested: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in nested {
        match val {
            Value::Array(_) => {}
            Value::Object(inner) => {
                // One level of flattening for breakdown variants.
                for (inner_key, inner_val) in inner {
                    if !matches!(inner_val, Value::Array(_) | Value::Object(_)) {
                        builder.push_record([
                            format!("{}.{}", key, inner_key).as_str(),
                            &scalar(inner_val),
                        ]);
                    }
                }
            }
            _ => builder.push_record([key, &scalar(val)]),
        }
    }
    println!("\n{}:", name);
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(title: &str, value: Option<&Value>) {
    let Some(Value::Array(notes)) = value else {
        return;
    };
    if notes.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for note in notes {
        println!("  - {}", scalar(note));
    }
}
