use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use lease_finance_core::amortization;
use lease_finance_core::metrics::{self, InvestmentMetricsInput, MetricsAssumptions};
use lease_finance_core::types::Money;
use lease_finance_core::PaymentFrequency;

use crate::input;

/// Arguments for loan investment metrics
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MetricsArgs {
    /// Path to JSON/YAML metrics input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount lent
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Monthly payment; derived from the loan terms when omitted
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Market value of the financed asset
    #[arg(long)]
    pub asset_value: Option<Decimal>,

    /// Annual revenue generated by the asset
    #[arg(long)]
    pub annual_revenue: Option<Decimal>,

    /// Annual operating expenses
    #[arg(long)]
    pub operating_expenses: Option<Decimal>,

    /// Annual discount rate as a decimal (0.08 = 8%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

/// A cash flow series: the outlay and the per-period flows after it
#[derive(Deserialize)]
struct CashFlowSeries {
    initial_investment: Money,
    cash_flows: Vec<Money>,
    #[serde(default)]
    rate: Option<Decimal>,
}

/// Arguments shared by the cash-flow commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CashFlowArgs {
    /// Path to JSON/YAML with `initial_investment`, `cash_flows` and optional `rate`
    #[arg(long)]
    pub input: Option<String>,

    /// Initial outlay at t=0 (positive number)
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Comma-separated cash flows for periods 1..n
    #[arg(long, value_delimiter = ',')]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate per period as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,
}

fn read_series(args: CashFlowArgs) -> Result<CashFlowSeries, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Ok(CashFlowSeries {
            initial_investment: args
                .initial
                .ok_or("--initial is required (or provide --input)")?,
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            rate: args.rate,
        })
    }
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let metrics_input: InvestmentMetricsInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        let term = args.term.ok_or("--term is required (or provide --input)")?;
        let monthly_payment = match args.payment {
            Some(p) => p,
            None => {
                amortization::periodic_payment(principal, rate, term, PaymentFrequency::Monthly)?
            }
        };
        InvestmentMetricsInput {
            principal,
            annual_interest_rate_pct: rate,
            term_months: term,
            monthly_payment,
            asset_value: args.asset_value,
            annual_revenue: args.annual_revenue,
            annual_operating_expenses: args.operating_expenses,
            discount_rate: args.discount_rate,
            assumptions: MetricsAssumptions::default(),
        }
    };
    let result = metrics::calculate_investment_metrics(&metrics_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_npv(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = read_series(args)?;
    let rate = series.rate.ok_or("a discount rate is required for NPV")?;
    let npv = metrics::calculate_npv(series.initial_investment, &series.cash_flows, rate)?;
    Ok(serde_json::json!({ "result": { "npv": npv, "rate": rate } }))
}

pub fn run_irr(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = read_series(args)?;
    let irr = metrics::calculate_irr(series.initial_investment, &series.cash_flows);
    let mut result = serde_json::to_value(&irr)?;
    if let (Value::Object(map), Some(rate)) = (&mut result, irr.rate()) {
        map.insert("irr".into(), serde_json::to_value(rate)?);
    }
    Ok(serde_json::json!({ "result": result }))
}

pub fn run_payback(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = read_series(args)?;
    let simple = metrics::cumulative_break_even(series.initial_investment, &series.cash_flows);
    let discounted = match series.rate {
        Some(rate) => Some(metrics::discounted_payback_period(
            series.initial_investment,
            &series.cash_flows,
            rate,
        )?),
        None => None,
    };
    Ok(serde_json::json!({
        "result": {
            "payback": simple.display("periods"),
            "payback_period": simple,
            "discounted_payback_period": discounted,
        }
    }))
}
