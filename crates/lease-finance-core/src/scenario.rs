//! A named, saveable bundle of loan, investor and leasing parameters, and
//! the one-shot calculation run over it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::{
    allocate_returns, allocation_totals, AllocationTotals, Investor, InvestorPolicy, InvestorReturn,
};
use crate::amortization::{
    generate_loan_schedule, summarize_schedule, LoanParameters, PaymentScheduleEntry,
    ScheduleSummary,
};
use crate::leasing::{calculate_leasing_financials, LeasingInputs, LeasingResult};
use crate::metrics::{
    calculate_investment_metrics, InvestmentMetrics, InvestmentMetricsInput, MetricsAssumptions,
};
use crate::types::*;
use crate::LeaseFinanceResult;

/// Optional overrides for the metric inputs the loan does not carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_revenue: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_operating_expenses: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(default)]
    pub assumptions: MetricsAssumptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub loan: LoanParameters,
    pub investors: Vec<Investor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leasing: Option<LeasingInputs>,
    #[serde(default)]
    pub policy: InvestorPolicy,
    #[serde(default)]
    pub metrics: MetricsOverrides,
}

impl Scenario {
    pub fn from_json(json: &str) -> LeaseFinanceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> LeaseFinanceResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_json(&self) -> LeaseFinanceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub name: String,
    pub periodic_payment: Money,
    pub schedule: Vec<PaymentScheduleEntry>,
    pub summary: ScheduleSummary,
    pub investor_returns: Vec<InvestorReturn>,
    pub allocation: AllocationTotals,
    /// Only computed for monthly loans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<InvestmentMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leasing: Option<LeasingResult>,
}

/// Run every calculation a scenario supports. Investors are checked against
/// the scenario's policy first; the computation itself never mutates the
/// scenario.
pub fn calculate_scenario(
    scenario: &Scenario,
) -> LeaseFinanceResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    scenario
        .policy
        .validate(&scenario.investors, scenario.loan.principal)?;

    let schedule = generate_loan_schedule(&scenario.loan)?;
    let summary = summarize_schedule(&schedule);
    let investor_returns = allocate_returns(&schedule, &scenario.investors)?;
    let allocation = allocation_totals(&investor_returns);

    let metrics = if scenario.loan.payment_frequency == PaymentFrequency::Monthly
        && scenario.loan.principal > Decimal::ZERO
    {
        let overrides = &scenario.metrics;
        let output = calculate_investment_metrics(&InvestmentMetricsInput {
            principal: scenario.loan.principal,
            annual_interest_rate_pct: scenario.loan.annual_interest_rate_pct,
            term_months: scenario.loan.term_months,
            monthly_payment: summary.periodic_payment,
            asset_value: overrides.asset_value,
            annual_revenue: overrides.annual_revenue,
            annual_operating_expenses: overrides.annual_operating_expenses,
            discount_rate: overrides.discount_rate,
            assumptions: overrides.assumptions.clone(),
        })?;
        warnings.extend(output.warnings);
        Some(output.result)
    } else {
        warnings.push("Investment metrics are only computed for monthly loans".into());
        None
    };

    let leasing = match &scenario.leasing {
        Some(inputs) => {
            let output = calculate_leasing_financials(inputs, scenario.loan.start_date)?;
            warnings.extend(output.warnings);
            Some(output.result)
        }
        None => None,
    };

    tracing::debug!(
        scenario = %scenario.name,
        investors = scenario.investors.len(),
        periods = schedule.len(),
        "scenario calculated"
    );

    let output = ScenarioOutput {
        name: scenario.name.clone(),
        periodic_payment: summary.periodic_payment,
        schedule,
        summary,
        investor_returns,
        allocation,
        metrics,
        leasing,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario: amortization, investor allocation, metrics, leasing",
        &serde_json::json!({
            "scenario": scenario.name,
            "principal": scenario.loan.principal.to_string(),
            "annual_interest_rate_pct": scenario.loan.annual_interest_rate_pct.to_string(),
            "term_months": scenario.loan.term_months,
            "payment_frequency": scenario.loan.payment_frequency,
            "investors": scenario.investors.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
