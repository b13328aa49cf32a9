pub mod file;
pub mod stdin;

use dbfom_core::Parameters;

/// Scenario parameters from `--input`, else piped stdin, else the base case.
///
/// Any field the JSON omits keeps its base-case value.
pub fn load_parameters(path: Option<&str>) -> Result<Parameters, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        tracing::debug!(path, "reading parameters from file");
        return file::read_json(path);
    }
    if let Some(params) = stdin::read_stdin()? {
        tracing::debug!("read parameters from stdin");
        return Ok(params);
    }
    tracing::debug!("no input supplied, using base case");
    Ok(Parameters::default())
}
