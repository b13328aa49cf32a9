use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use dbfom_core::build_dbfom_model;
use dbfom_core::sensitivity::{run_sensitivity, SensitivityGridInput};

use crate::input;
use crate::output::{csv_out::write_tabular, tabular};

/// Arguments for exporting every schedule to CSV
#[derive(Args)]
pub struct ExportArgs {
    /// Path to JSON parameters file (base case when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Directory to write the CSV files into (created if missing)
    #[arg(long, default_value = "models")]
    pub out_dir: String,
}

#[derive(Debug, Serialize)]
struct ExportedFile {
    file: String,
    rows: usize,
}

fn write_rows<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
) -> Result<ExportedFile, Box<dyn std::error::Error>> {
    let path = dir.join(name);
    let mut wtr = csv::Writer::from_path(&path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    tracing::debug!(file = %path.display(), rows = rows.len(), "exported schedule");
    Ok(ExportedFile {
        file: name.to_string(),
        rows: rows.len(),
    })
}

pub fn run_export(args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = input::load_parameters(args.input.as_deref())?;
    let output = build_dbfom_model(&params)?;
    let model = &output.result;

    let dir = PathBuf::from(&args.out_dir);
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;

    let mut files = vec![
        write_rows(&dir, "city_receivable.csv", &model.city_receivable.rows)?,
        write_rows(&dir, "debt_schedule.csv", &model.debt_schedule.rows)?,
        write_rows(&dir, "om_schedule.csv", &model.om_schedule)?,
        write_rows(&dir, "income_statement.csv", &model.income_statement)?,
        write_rows(&dir, "cash_flow.csv", &model.cash_flow)?,
        write_rows(&dir, "balance_sheet.csv", &model.balance_sheet)?,
        write_rows(&dir, "equity_cash_flows.csv", &model.equity_cash_flows)?,
    ];

    let grid = run_sensitivity(&params, &SensitivityGridInput::default())?;
    if let Some(layout) = tabular(&serde_json::to_value(&grid.result)?) {
        let path = dir.join("sensitivity.csv");
        let mut wtr = csv::Writer::from_path(&path)?;
        write_tabular(&mut wtr, &layout)?;
        wtr.flush()?;
        files.push(ExportedFile {
            file: "sensitivity.csv".into(),
            rows: layout.rows.len(),
        });
    }

    tracing::info!(dir = %dir.display(), files = files.len(), "export complete");

    Ok(serde_json::json!({
        "result": {
            "path": dir.display().to_string(),
            "files": files,
        },
        "warnings": output.warnings,
    }))
}
