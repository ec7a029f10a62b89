mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::financing::{AmortizeArgs, LoanCompareArgs};
use commands::leasing::{ExpensesArgs, LeaseArgs, RentRollArgs};

/// Property proforma schedules
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Property proforma lease, rent roll, expense and loan schedules",
    long_about = "Builds the month-by-month tables behind a property investment proforma \
                  with decimal precision: lease rent schedules with partial-month proration \
                  and annual escalations, aggregated rent rolls, pro-rata operating expense \
                  recoveries, and loan amortization with additional principal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Print only one field of the result (e.g. rows, monthly, periods)
    #[arg(long, global = true)]
    section: Option<String>,

    /// Log calculation detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a monthly rent schedule for one lease
    Lease(LeaseArgs),
    /// Aggregate several leases into monthly and yearly rent
    RentRoll(RentRollArgs),
    /// Allocate building operating expenses to tenants
    Expenses(ExpensesArgs),
    /// Generate a loan amortization table
    Amortize(AmortizeArgs),
    /// Compare payoff summaries for several loans
    LoanCompare(LoanCompareArgs),
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
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Lease(args) => commands::leasing::run_lease(args),
        Commands::RentRoll(args) => commands::leasing::run_rent_roll(args),
        Commands::Expenses(args) => commands::leasing::run_expenses(args),
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::LoanCompare(args) => commands::financing::run_loan_compare(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let result = result.and_then(|value| match cli.section.as_deref() {
        Some(section) => output::select_section(value, section).map_err(Into::into),
        None => Ok(value),
    });

    match result {
        Ok(value) => {
            debug!(format = ?cli.output, "writing output");
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
