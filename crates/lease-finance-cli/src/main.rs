mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::leasing::LeasingArgs;
use commands::loan::{AllocateArgs, PaymentArgs, ScheduleArgs};
use commands::metrics::{CashFlowArgs, MetricsArgs};
use commands::projections::{ProjectionArgs, QuarterlyArgs};
use commands::scenario::ScenarioArgs;

/// Multi-investor loan and leasing calculations
#[derive(Parser)]
#[command(
    name = "lfc",
    version,
    about = "Multi-investor loan and leasing calculations",
    long_about = "A CLI for loan amortization, pro-rata investor allocation, leasing deal \
                  pricing and investment metrics with decimal precision. Reads flags, \
                  a JSON/YAML --input file, or JSON piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Diagnostic log format on stderr (level set by LFC_LOG)
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a loan amortization schedule
    Schedule(ScheduleArgs),
    /// Calculate the level payment for a loan
    Payment(PaymentArgs),
    /// Allocate loan payments across investors pro rata
    Allocate(AllocateArgs),
    /// Price a leasing deal (client quotation, lessor cost, profitability)
    Leasing(LeasingArgs),
    /// Calculate lender investment metrics (NPV, IRR, DSCR, LTV, payback)
    Metrics(MetricsArgs),
    /// Net present value of a cash flow series
    Npv(CashFlowArgs),
    /// Internal rate of return of a cash flow series
    Irr(CashFlowArgs),
    /// Payback period of a cash flow series
    Payback(CashFlowArgs),
    /// Annual financial projections
    Projections(ProjectionArgs),
    /// Quarterly performance projection
    Quarterly(QuarterlyArgs),
    /// Run a saved scenario end to end
    Scenario(ScenarioArgs),
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

#[derive(Debug, Clone, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: &LogFormat) {
    let env_filter = EnvFilter::try_from_env("LFC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.compact().init(),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_format);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Allocate(args) => commands::loan::run_allocate(args),
        Commands::Leasing(args) => commands::leasing::run_leasing(args),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Npv(args) => commands::metrics::run_npv(args),
        Commands::Irr(args) => commands::metrics::run_irr(args),
        Commands::Payback(args) => commands::metrics::run_payback(args),
        Commands::Projections(args) => commands::projections::run_projections(args),
        Commands::Quarterly(args) => commands::projections::run_quarterly(args),
        Commands::Scenario(args) => commands::scenario::run_scenario(args),
        Commands::Version => {
            println!("lfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
