mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::export::ExportArgs;
use commands::model::ModelArgs;
use commands::payment::PaymentArgs;
use commands::sensitivity::SensitivityArgs;
use commands::sources_uses::SourcesUsesArgs;
use commands::summary::SummaryArgs;

/// DBFOM wastewater concession financial model
#[derive(Parser)]
#[command(
    name = "dbfom",
    version,
    about = "DBFOM wastewater concession financial model",
    long_about = "Runs the monthly financial model of a design-build-finance-operate-maintain \
                  wastewater concession with decimal precision: city receivable and debt \
                  amortization, O&M cost-plus revenue, income statement, cash flow, balance \
                  sheet and levered equity IRR. Parameters default to the base case and can \
                  be overridden with a JSON file or piped stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full model, or print one schedule or statement
    Model(ModelArgs),
    /// Executive summary with an optional hurdle-rate decision
    Summary(SummaryArgs),
    /// Levered IRR across O&M markup × city rate
    Sensitivity(SensitivityArgs),
    /// Sources & uses of funds at COD
    SourcesUses(SourcesUsesArgs),
    /// Level payment and amortization for any principal, rate and term
    Payment(PaymentArgs),
    /// Write every schedule and statement to CSV files
    Export(ExportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Summary(args) => commands::summary::run_summary(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::SourcesUses(args) => commands::sources_uses::run_sources_uses(args),
        Commands::Payment(args) => commands::payment::run_payment(args),
        Commands::Export(args) => commands::export::run_export(args),
        Commands::Version => {
            println!("dbfom {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
