use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use lease_finance_core::leasing::{self, LeasingInputs};

use crate::input;

/// Arguments for leasing deal pricing
#[derive(Args)]
pub struct LeasingArgs {
    /// Path to JSON/YAML leasing inputs
    #[arg(long)]
    pub input: Option<String>,

    /// Lease start date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_leasing(args: LeasingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let leasing_input: LeasingInputs = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for leasing".into());
    };
    let start = args
        .start_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let result = leasing::calculate_leasing_financials(&leasing_input, start)?;
    Ok(serde_json::to_value(result)?)
}
