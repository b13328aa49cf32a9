use serde_json::Value;
use std::io;

use super::{cell_text, tabular, Tabular};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let outcome = match (tabular(result), result) {
        (Some(layout), _) => write_tabular(&mut wtr, &layout),
        (None, Value::Object(map)) => write_fields(&mut wtr, map),
        (None, other) => wtr.write_record([cell_text(other)]),
    };
    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

/// Write a header row followed by every data row.
pub fn write_tabular<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    layout: &Tabular,
) -> Result<(), csv::Error> {
    wtr.write_record(&layout.headers)?;
    for row in &layout.rows {
        wtr.write_record(row)?;
    }
    Ok(())
}

/// Two-column CSV: field, value.
fn write_fields<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &serde_json::Map<String, Value>,
) -> Result<(), csv::Error> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &cell_text(val)])?;
    }
    Ok(())
}
