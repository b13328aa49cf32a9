use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{cell_text, tabular, Tabular};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                print_field_table(map);
            }
        }
        other => print_result(other),
    }
}

fn print_result(result: &Value) {
    if let Some(layout) = tabular(result) {
        println!("{}", build_table(&layout));
        return;
    }
    match result {
        Value::Object(map) => print_field_table(map),
        Value::Array(_) => println!("(empty)"),
        other => println!("{}", cell_text(other)),
    }
}

fn build_table(layout: &Tabular) -> Table {
    let mut builder = Builder::default();
    builder.push_record(layout.headers.iter().cloned());
    for row in &layout.rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build()
}

fn print_field_table(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), cell_text(val)]);
    }
    println!("{}", builder.build());
}

fn print_envelope_notes(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
