use serde_json::Value;

use super::cell_text;

/// Print just the key answer value from the output.
///
/// Looks for the headline figure of each command in priority order, one
/// level deep, then falls back to the first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match headline(result_obj) {
        Some(text) => println!("{}", text),
        None => println!("{}", cell_text(result_obj)),
    }
}

fn headline(result: &Value) -> Option<String> {
    // Nested objects searched after the top level: the full model keeps its
    // IRR under "returns"
    let priority_keys = [
        "annualized_irr",
        "payment",
        "base_case_value",
        "check",
        "monthly_irr",
        "path",
    ];

    let map = result.as_object()?;
    for key in &priority_keys {
        let mut scopes = std::iter::once(map).chain(map.values().filter_map(Value::as_object));
        if let Some(val) = scopes.find_map(|scope| scope.get(*key).filter(|v| !v.is_null())) {
            return Some(cell_text(val));
        }
    }

    map.iter()
        .next()
        .map(|(key, val)| format!("{}: {}", key, cell_text(val)))
}
