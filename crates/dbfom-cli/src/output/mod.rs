pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A result laid out as header + rows.
#[derive(Debug, PartialEq)]
pub struct Tabular {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Lay out results that are naturally tabular: a list of monthly rows, or a
/// sensitivity grid (one row per markup, one column per city rate).
pub fn tabular(result: &Value) -> Option<Tabular> {
    match result {
        Value::Array(items) => array_rows(items),
        Value::Object(map) if map.contains_key("matrix") => Some(grid_rows(result)),
        _ => None,
    }
}

fn array_rows(items: &[Value]) -> Option<Tabular> {
    let Value::Object(first) = items.first()? else {
        return None;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|h| map.get(h).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    Some(Tabular { headers, rows })
}

fn grid_rows(grid: &Value) -> Tabular {
    let empty = Vec::new();
    let columns = grid["column_values"].as_array().unwrap_or(&empty);
    let markups = grid["row_values"].as_array().unwrap_or(&empty);
    let matrix = grid["matrix"].as_array().unwrap_or(&empty);

    let mut headers = vec![format!(
        "{} \\ {}",
        cell_text(&grid["row_variable"]),
        cell_text(&grid["column_variable"])
    )];
    headers.extend(columns.iter().map(cell_text));

    let rows = markups
        .iter()
        .zip(matrix)
        .map(|(markup, cells)| {
            let mut row = vec![cell_text(markup)];
            row.extend(cells.as_array().unwrap_or(&empty).iter().map(|cell| match cell {
                Value::Null => "n/a".to_string(),
                other => cell_text(other),
            }));
            row
        })
        .collect();

    Tabular { headers, rows }
}

/// Plain-text rendering of a scalar JSON value.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(cell_text).collect::<Vec<_>>().join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
