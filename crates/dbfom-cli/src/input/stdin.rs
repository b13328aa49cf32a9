use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialise piped stdin into a typed struct.
///
/// `None` when stdin is a terminal or carries only whitespace, so callers
/// can fall back to their defaults.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read stdin: {e}"))?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse stdin: {e}"))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbfom_core::Parameters;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_pipe_means_no_input() {
        assert!(parse_piped::<Parameters>("").unwrap().is_none());
        assert!(parse_piped::<Parameters>(" \n\t ").unwrap().is_none());
    }

    #[test]
    fn test_piped_scenario_overrides_base_case() {
        let params: Parameters = parse_piped("\n{\"om_markup\": \"0.12\"}\n").unwrap().unwrap();
        assert_eq!(params.om_markup, dec!(0.12));
        assert_eq!(params.epc, dec!(62_000_000));
    }

    #[test]
    fn test_malformed_pipe_is_an_error() {
        let err = parse_piped::<Parameters>("{\"epc\": ").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse stdin"));
    }
}
