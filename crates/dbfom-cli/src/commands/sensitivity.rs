use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dbfom_core::sensitivity::{run_sensitivity as run_grid, SensitivityGridInput};

use crate::input;

/// Arguments for the markup × city rate sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON parameters file for the base scenario
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated O&M markups (grid rows), e.g. 0.05,0.10,0.15
    #[arg(long, value_delimiter = ',')]
    pub markups: Option<Vec<Decimal>>,

    /// Comma-separated city effective annual rates (grid columns)
    #[arg(long, value_delimiter = ',')]
    pub city_rates: Option<Vec<Decimal>>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = input::load_parameters(args.input.as_deref())?;
    let defaults = SensitivityGridInput::default();
    let grid_input = SensitivityGridInput {
        markups: args.markups.unwrap_or(defaults.markups),
        city_rates: args.city_rates.unwrap_or(defaults.city_rates),
    };

    let output = run_grid(&params, &grid_input)?;
    Ok(serde_json::to_value(output)?)
}
