use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DbfomError;
use crate::model::run_model;
use crate::parameters::Parameters;
use crate::types::*;
use crate::DbfomResult;

/// Axes of the O&M markup × city rate sensitivity grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityGridInput {
    /// O&M markups, one grid row each
    pub markups: Vec<Rate>,
    /// City effective annual rates, one grid column each
    pub city_rates: Vec<Rate>,
}

impl Default for SensitivityGridInput {
    fn default() -> Self {
        Self {
            markups: vec![dec!(0.05), dec!(0.10), dec!(0.15)],
            city_rates: vec![dec!(0.0575), dec!(0.0675), dec!(0.0775)],
        }
    }
}

/// Annualized levered IRR for each (markup, city rate) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub row_variable: String,
    pub column_variable: String,
    pub row_values: Vec<Rate>,
    pub column_values: Vec<Rate>,
    pub output_metric: String,
    /// matrix[i][j] = IRR at row_values[i], column_values[j]; `None` when that
    /// scenario could not be solved
    pub matrix: Vec<Vec<Option<Rate>>>,
    /// IRR of the unmodified scenario
    pub base_case_value: Rate,
    /// Cell matching the unmodified scenario, if it lies on the grid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_case_position: Option<(usize, usize)>,
}

fn annualized_irr(params: &Parameters) -> DbfomResult<Rate> {
    run_model(params).map(|(model, _)| model.returns.annualized_irr)
}

/// Re-run the model over every markup × city rate pair, all other
/// parameters held at `base`.
pub fn run_sensitivity(
    base: &Parameters,
    input: &SensitivityGridInput,
) -> DbfomResult<ComputationOutput<SensitivityGrid>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.markups.is_empty() {
        return Err(DbfomError::invalid("markups", "At least one markup is required"));
    }
    if input.city_rates.is_empty() {
        return Err(DbfomError::invalid(
            "city_rates",
            "At least one city rate is required",
        ));
    }

    let base_case_value = annualized_irr(base)?;

    let mut matrix = Vec::with_capacity(input.markups.len());
    for &markup in &input.markups {
        let mut row = Vec::with_capacity(input.city_rates.len());
        for &city_rate in &input.city_rates {
            let scenario = Parameters {
                om_markup: markup,
                city_rate_annual: city_rate,
                ..base.clone()
            };
            match annualized_irr(&scenario) {
                Ok(irr) => row.push(Some(irr)),
                Err(e) => {
                    warnings.push(format!(
                        "Scenario failed at markup={markup}, city_rate={city_rate}: {e}"
                    ));
                    row.push(None);
                }
            }
        }
        matrix.push(row);
    }

    let base_case_position = input
        .markups
        .iter()
        .position(|m| *m == base.om_markup)
        .zip(
            input
                .city_rates
                .iter()
                .position(|r| *r == base.city_rate_annual),
        );

    tracing::info!(
        rows = input.markups.len(),
        columns = input.city_rates.len(),
        failed = warnings.len(),
        "sensitivity grid evaluated"
    );

    let grid = SensitivityGrid {
        row_variable: "om_markup".into(),
        column_variable: "city_rate_annual".into(),
        row_values: input.markups.clone(),
        column_values: input.city_rates.clone(),
        output_metric: "annualized_irr".into(),
        matrix,
        base_case_value,
        base_case_position,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-way sensitivity of levered equity IRR to O&M markup and city rate",
        &serde_json::json!({
            "row_variable": "om_markup",
            "column_variable": "city_rate_annual",
            "held_constant": "all other scenario parameters",
        }),
        warnings,
        elapsed,
        grid,
    ))
}
