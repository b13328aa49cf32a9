use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dbfom_core::build_dbfom_model;
use dbfom_core::summary::build_executive_summary;

use crate::input;

/// Arguments for the executive summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON parameters file (base case when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Equity hurdle rate as a decimal (e.g. 0.10); drives the proceed/reject decision
    #[arg(long)]
    pub hurdle: Option<Decimal>,

    /// Preparation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub prepared_on: Option<NaiveDate>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = input::load_parameters(args.input.as_deref())?;
    let output = build_dbfom_model(&params)?;
    let prepared_on = args
        .prepared_on
        .unwrap_or_else(|| Local::now().date_naive());

    let summary = build_executive_summary(&output.result, args.hurdle, prepared_on);
    Ok(serde_json::json!({
        "result": summary,
        "methodology": output.methodology,
        "warnings": output.warnings,
        "metadata": output.metadata,
    }))
}
