use clap::{Args, ValueEnum};
use serde_json::Value;

use dbfom_core::build_dbfom_model;

use crate::input;

/// Which part of the model to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    All,
    Receivable,
    Debt,
    Om,
    Income,
    CashFlow,
    BalanceSheet,
    Equity,
    Returns,
}

impl Section {
    /// Path of the section within the serialized model.
    fn path(self) -> &'static [&'static str] {
        match self {
            Section::All => &[],
            Section::Receivable => &["city_receivable", "rows"],
            Section::Debt => &["debt_schedule", "rows"],
            Section::Om => &["om_schedule"],
            Section::Income => &["income_statement"],
            Section::CashFlow => &["cash_flow"],
            Section::BalanceSheet => &["balance_sheet"],
            Section::Equity => &["equity_cash_flows"],
            Section::Returns => &["returns"],
        }
    }
}

/// Arguments for the full model run
#[derive(Args)]
pub struct ModelArgs {
    /// Path to JSON parameters file (base case when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Print only one schedule or statement
    #[arg(long, value_enum, default_value = "all")]
    pub section: Section,
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = input::load_parameters(args.input.as_deref())?;
    let output = build_dbfom_model(&params)?;
    let mut value = serde_json::to_value(output)?;
    select_section(&mut value, args.section)?;
    Ok(value)
}

/// Replace the envelope's `result` with the chosen section.
pub(crate) fn select_section(
    envelope: &mut Value,
    section: Section,
) -> Result<(), Box<dyn std::error::Error>> {
    if section == Section::All {
        return Ok(());
    }
    let mut selected = envelope.get("result").cloned().unwrap_or(Value::Null);
    for key in section.path() {
        selected = selected
            .get(*key)
            .cloned()
            .ok_or_else(|| format!("Model output has no '{key}' section"))?;
    }
    envelope["result"] = selected;
    Ok(())
}
