use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use dbfom_core::Parameters;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Empty input means the base case; otherwise fields override it.
fn parse_parameters(params_json: &str) -> NapiResult<Parameters> {
    if params_json.trim().is_empty() {
        return Ok(Parameters::default());
    }
    serde_json::from_str(params_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[napi]
pub fn build_dbfom_model(params_json: String) -> NapiResult<String> {
    let params = parse_parameters(&params_json)?;
    let output = dbfom_core::build_dbfom_model(&params).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_sensitivity(params_json: String, grid_json: Option<String>) -> NapiResult<String> {
    let params = parse_parameters(&params_json)?;
    let grid: dbfom_core::sensitivity::SensitivityGridInput = match grid_json {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str(&json).map_err(to_napi_error)?
        }
        _ => Default::default(),
    };
    let output =
        dbfom_core::sensitivity::run_sensitivity(&params, &grid).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `hurdle` is a decimal string ("0.10"); `prepared_on` is YYYY-MM-DD and
/// defaults to today.
#[napi]
pub fn executive_summary(
    params_json: String,
    hurdle: Option<String>,
    prepared_on: Option<String>,
) -> NapiResult<String> {
    let params = parse_parameters(&params_json)?;
    let hurdle = hurdle
        .map(|h| h.trim().parse::<Decimal>())
        .transpose()
        .map_err(to_napi_error)?;
    let prepared_on = match prepared_on {
        Some(date) => date.parse::<chrono::NaiveDate>().map_err(to_napi_error)?,
        None => chrono::Local::now().date_naive(),
    };

    let output = dbfom_core::build_dbfom_model(&params).map_err(to_napi_error)?;
    let summary =
        dbfom_core::summary::build_executive_summary(&output.result, hurdle, prepared_on);
    serde_json::to_string(&summary).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LevelPaymentInput {
    rate: Decimal,
    periods: u32,
    principal: Decimal,
    /// Treat `rate` as an effective annual rate
    #[serde(default)]
    annual: bool,
}

#[napi]
pub fn level_payment(input_json: String) -> NapiResult<String> {
    let input: LevelPaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rate = if input.annual {
        dbfom_core::time_value::monthly_rate_from_annual(input.rate).map_err(to_napi_error)?
    } else {
        input.rate
    };
    let schedule =
        dbfom_core::schedules::build_amortization_schedule(rate, input.periods, input.principal)
            .map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}
