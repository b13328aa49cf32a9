use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Resolve against the working directory and require an existing file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbfom_core::Parameters;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_partial_parameters_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tax_rate": "0.25", "ops_months": 120}}"#).unwrap();

        let params: Parameters = read_json(file.path().to_str().unwrap()).unwrap();
        assert_eq!(params.tax_rate, dec!(0.25));
        assert_eq!(params.ops_months, 120);
        assert_eq!(params.build_months, 24);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_json::<Parameters>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json::<Parameters>(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Not a file"));
    }
}
