use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use lease_finance_core::allocation::{self, Investor, InvestorPolicy};
use lease_finance_core::amortization::{self, LoanParameters};
use lease_finance_core::PaymentFrequency;

use crate::input;

/// Arguments shared by the loan commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanFlags {
    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (10 = 10%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Payment frequency: monthly, quarterly, semi-annual or annual
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,
}

/// Arguments for the amortization schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    /// Path to JSON/YAML loan parameters (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanFlags,

    /// Loan start date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

/// Arguments for the level payment
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    #[command(flatten)]
    pub loan: LoanFlags,
}

/// Arguments for investor allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON/YAML with `loan`, `investors` and optional `policy`
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct AllocationRequest {
    loan: LoanParameters,
    investors: Vec<Investor>,
    #[serde(default)]
    policy: Option<InvestorPolicy>,
}

fn loan_from_flags(
    flags: &LoanFlags,
    start_date: Option<NaiveDate>,
) -> Result<LoanParameters, Box<dyn std::error::Error>> {
    Ok(LoanParameters {
        principal: flags
            .principal
            .ok_or("--principal is required (or provide --input)")?,
        annual_interest_rate_pct: flags.rate.ok_or("--rate is required (or provide --input)")?,
        term_months: flags.term.ok_or("--term is required (or provide --input)")?,
        start_date: start_date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        payment_frequency: flags.frequency,
    })
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: LoanParameters = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        loan_from_flags(&args.loan, args.start_date)?
    };

    let schedule = amortization::generate_loan_schedule(&params)?;
    Ok(serde_json::to_value(schedule)?)
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = loan_from_flags(&args.loan, None)?;
    let payment = amortization::periodic_payment(
        params.principal,
        params.annual_interest_rate_pct,
        params.term_months,
        params.payment_frequency,
    )?;
    Ok(serde_json::json!({
        "result": {
            "payment": payment,
            "payment_frequency": params.payment_frequency,
            "number_of_payments": params.term_months / params.payment_frequency.months_per_period(),
        }
    }))
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AllocationRequest = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for investor allocation".into());
    };

    if let Some(policy) = &request.policy {
        policy.validate(&request.investors, request.loan.principal)?;
    }

    let schedule = amortization::generate_loan_schedule(&request.loan)?;
    let returns = allocation::allocate_returns(&schedule, &request.investors)?;
    let totals = allocation::allocation_totals(&returns);
    Ok(serde_json::json!({
        "results": returns,
        "totals": totals,
    }))
}
