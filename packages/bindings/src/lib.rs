use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use lease_finance_core::allocation::{self, Investor, InvestorPolicy};
use lease_finance_core::amortization::{self, LoanParameters};
use lease_finance_core::leasing::{self, LeasingInputs};
use lease_finance_core::metrics::{self, InvestmentMetricsInput};
use lease_finance_core::projections::{self, QuarterlyPerformanceInput};
use lease_finance_core::scenario::{self, Scenario};
use lease_finance_core::types::{decimal_from_f64, Money};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<'a, T: Deserialize<'a>>(input_json: &'a str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn to_json<T: serde::Serialize>(value: &T) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let params: LoanParameters = parse(&input_json)?;
    let schedule = amortization::generate_loan_schedule(&params).map_err(to_napi_error)?;
    to_json(&schedule)
}

/// Level monthly payment. Rejects NaN and infinite arguments.
#[napi]
pub fn calculate_monthly_payment(
    principal: f64,
    annual_rate_pct: f64,
    term_months: u32,
) -> NapiResult<String> {
    let principal = decimal_from_f64(principal, "principal").map_err(to_napi_error)?;
    let rate =
        decimal_from_f64(annual_rate_pct, "annual_interest_rate_pct").map_err(to_napi_error)?;
    let payment = amortization::calculate_monthly_payment(principal, rate, term_months)
        .map_err(to_napi_error)?;
    Ok(payment.to_string())
}

#[derive(Deserialize)]
struct AllocationRequest {
    loan: LoanParameters,
    investors: Vec<Investor>,
    #[serde(default)]
    policy: Option<InvestorPolicy>,
}

#[napi]
pub fn allocate_investor_returns(input_json: String) -> NapiResult<String> {
    let request: AllocationRequest = parse(&input_json)?;
    if let Some(policy) = &request.policy {
        policy
            .validate(&request.investors, request.loan.principal)
            .map_err(to_napi_error)?;
    }
    let schedule = amortization::generate_loan_schedule(&request.loan).map_err(to_napi_error)?;
    let returns =
        allocation::allocate_returns(&schedule, &request.investors).map_err(to_napi_error)?;
    let totals = allocation::allocation_totals(&returns);
    to_json(&serde_json::json!({ "results": returns, "totals": totals }))
}

// ---------------------------------------------------------------------------
// Leasing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LeasingRequest {
    #[serde(flatten)]
    inputs: LeasingInputs,
    start_date: NaiveDate,
}

#[napi]
pub fn calculate_leasing(input_json: String) -> NapiResult<String> {
    let request: LeasingRequest = parse(&input_json)?;
    let output = leasing::calculate_leasing_financials(&request.inputs, request.start_date)
        .map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CashFlowSeries {
    initial_investment: Money,
    cash_flows: Vec<Money>,
    #[serde(default)]
    rate: Decimal,
}

#[napi]
pub fn investment_metrics(input_json: String) -> NapiResult<String> {
    let input: InvestmentMetricsInput = parse(&input_json)?;
    let output = metrics::calculate_investment_metrics(&input).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn calculate_npv(input_json: String) -> NapiResult<String> {
    let series: CashFlowSeries = parse(&input_json)?;
    let npv = metrics::calculate_npv(series.initial_investment, &series.cash_flows, series.rate)
        .map_err(to_napi_error)?;
    Ok(npv.to_string())
}

/// Tagged IRR result: `{"status":"converged","rate":..}` or
/// `{"status":"not_converged","reason":..}`.
#[napi]
pub fn calculate_irr(input_json: String) -> NapiResult<String> {
    let series: CashFlowSeries = parse(&input_json)?;
    to_json(&metrics::calculate_irr(series.initial_investment, &series.cash_flows))
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ProjectionRequest {
    principal: Money,
    base_cash_flow: Money,
    #[serde(default)]
    annual_growth_rate: Decimal,
    discount_rate: Decimal,
    years: u32,
}

#[napi]
pub fn financial_projections(input_json: String) -> NapiResult<String> {
    let req: ProjectionRequest = parse(&input_json)?;
    let series = projections::generate_financial_projections(
        req.principal,
        req.base_cash_flow,
        req.annual_growth_rate,
        req.discount_rate,
        req.years,
    )
    .map_err(to_napi_error)?;
    to_json(&series)
}

#[napi]
pub fn quarterly_performance(input_json: String) -> NapiResult<String> {
    let input: QuarterlyPerformanceInput = parse(&input_json)?;
    let series = projections::generate_quarterly_performance(&input).map_err(to_napi_error)?;
    to_json(&series)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn run_scenario(input_json: String) -> NapiResult<String> {
    let scenario = Scenario::from_json(&input_json).map_err(to_napi_error)?;
    let output = scenario::calculate_scenario(&scenario).map_err(to_napi_error)?;
    to_json(&output)
}
