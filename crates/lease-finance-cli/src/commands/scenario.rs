use clap::Args;
use serde_json::Value;

use lease_finance_core::scenario::{self, Scenario};

use crate::input;

/// Arguments for a full scenario run
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to a saved JSON/YAML scenario
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: Scenario = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <scenario.json|yaml> or stdin required for scenario".into());
    };
    let result = scenario::calculate_scenario(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}
