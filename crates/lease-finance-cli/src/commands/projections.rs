use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lease_finance_core::projections::{self, QuarterlyPerformanceInput};

use crate::input;

/// Arguments for annual projections
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectionArgs {
    /// Amount invested at t=0
    #[arg(long)]
    pub principal: Decimal,

    /// First-year cash flow
    #[arg(long)]
    pub cash_flow: Decimal,

    /// Annual growth rate as a decimal
    #[arg(long, default_value = "0")]
    pub growth: Decimal,

    /// Annual discount rate as a decimal
    #[arg(long)]
    pub discount_rate: Decimal,

    /// Number of years
    #[arg(long, default_value = "5")]
    pub years: u32,
}

/// Arguments for quarterly performance
#[derive(Args)]
pub struct QuarterlyArgs {
    /// Path to JSON/YAML quarterly performance input
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_projections(args: ProjectionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = projections::generate_financial_projections(
        args.principal,
        args.cash_flow,
        args.growth,
        args.discount_rate,
        args.years,
    )?;
    Ok(serde_json::to_value(series)?)
}

pub fn run_quarterly(args: QuarterlyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quarterly_input: QuarterlyPerformanceInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for quarterly performance".into());
    };
    let series = projections::generate_quarterly_performance(&quarterly_input)?;
    Ok(serde_json::to_value(series)?)
}
