use clap::Args;
use serde_json::Value;

use dbfom_core::sources_uses::build_sources_uses;

use crate::input;

/// Arguments for the sources & uses table at COD
#[derive(Args)]
pub struct SourcesUsesArgs {
    /// Path to JSON parameters file (base case when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sources_uses(args: SourcesUsesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = input::load_parameters(args.input.as_deref())?;
    params.validate()?;
    let table = build_sources_uses(&params);
    Ok(serde_json::json!({ "result": table }))
}
