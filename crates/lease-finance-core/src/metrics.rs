//! Investment metrics for a lender funding a level-payment loan: NPV, IRR,
//! coverage ratios, payback and break-even.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::validate_term;
use crate::error::LeaseFinanceError;
use crate::time_value::{self, IrrResult, NonConvergence};
use crate::types::*;
use crate::LeaseFinanceResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const DSCR_WARNING_THRESHOLD: Decimal = dec!(1.2);
const LTV_WARNING_THRESHOLD: Decimal = dec!(0.8);

// ---------------------------------------------------------------------------
// Payback / break-even
// ---------------------------------------------------------------------------

/// Time to recover an outlay. The three states are distinct on purpose:
/// `Never` means capital is at risk and is not recovered, `NotApplicable`
/// means nothing was at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaybackPeriod {
    Periods { periods: Decimal },
    Never,
    NotApplicable,
}

impl PaybackPeriod {
    pub fn periods(&self) -> Option<Decimal> {
        match self {
            PaybackPeriod::Periods { periods } => Some(*periods),
            _ => None,
        }
    }

    /// Render for reports, e.g. "14.25 months", "Never" or "N/A".
    pub fn display(&self, unit: &str) -> String {
        match self {
            PaybackPeriod::Periods { periods } => format!("{} {unit}", periods.round_dp(2)),
            PaybackPeriod::Never => "Never".to_string(),
            PaybackPeriod::NotApplicable => "N/A".to_string(),
        }
    }
}

/// Simple payback: `initial / periodic_net_cash_flow`.
pub fn payback_period(initial_investment: Money, periodic_net_cash_flow: Money) -> PaybackPeriod {
    if initial_investment <= Decimal::ZERO {
        PaybackPeriod::NotApplicable
    } else if periodic_net_cash_flow <= Decimal::ZERO {
        PaybackPeriod::Never
    } else {
        PaybackPeriod::Periods {
            periods: initial_investment / periodic_net_cash_flow,
        }
    }
}

/// First (interpolated) period at which the running sum of `flows` covers
/// `initial_investment`.
fn recovery_crossing(
    initial_investment: Money,
    flows: impl Iterator<Item = Money>,
) -> PaybackPeriod {
    if initial_investment <= Decimal::ZERO {
        return PaybackPeriod::NotApplicable;
    }

    let mut cumulative = Decimal::ZERO;
    for (i, flow) in flows.enumerate() {
        let prev = cumulative;
        cumulative = cumulative.saturating_add(flow);
        if cumulative >= initial_investment {
            let needed = initial_investment - prev;
            let fraction = if flow > Decimal::ZERO {
                needed / flow
            } else {
                Decimal::ZERO
            };
            return PaybackPeriod::Periods {
                periods: Decimal::from(i as u64) + fraction,
            };
        }
    }

    PaybackPeriod::Never
}

/// Payback on cash flows discounted at `rate` per period. `Never` when the
/// discounted flows do not recover the outlay within the series.
pub fn discounted_payback_period(
    initial_investment: Money,
    cash_flows: &[Money],
    rate: Rate,
) -> LeaseFinanceResult<PaybackPeriod> {
    if rate <= dec!(-1) {
        return Err(LeaseFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let discount = Decimal::ONE / (Decimal::ONE + rate);
    let mut factor = Decimal::ONE;
    let discounted = cash_flows.iter().map(move |cf| {
        factor = factor.saturating_mul(discount);
        cf.saturating_mul(factor)
    });
    Ok(recovery_crossing(initial_investment, discounted))
}

/// Period index at which cumulative `-initial + sum(cash_flows)` turns
/// non-negative.
pub fn cumulative_break_even(initial_investment: Money, cash_flows: &[Money]) -> PaybackPeriod {
    recovery_crossing(initial_investment, cash_flows.iter().copied())
}

/// Classic break-even: `fixed_costs / (revenue - variable_cost)` per period.
pub fn break_even_point(
    fixed_costs: Money,
    periodic_revenue: Money,
    periodic_variable_cost: Money,
) -> PaybackPeriod {
    payback_period(fixed_costs, periodic_revenue - periodic_variable_cost)
}

pub fn calculate_npv(
    initial_investment: Money,
    cash_flows: &[Money],
    discount_rate: Rate,
) -> LeaseFinanceResult<Money> {
    time_value::npv(initial_investment, cash_flows, discount_rate)
}

pub fn calculate_irr(initial_investment: Money, cash_flows: &[Money]) -> IrrResult {
    time_value::irr(initial_investment, cash_flows)
}

// ---------------------------------------------------------------------------
// Loan-level metrics
// ---------------------------------------------------------------------------

/// Fallbacks used when the caller omits asset value or revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsAssumptions {
    /// Asset value as a multiple of principal
    pub asset_value_multiple: Multiple,
    /// Annual revenue as a multiple of annual debt service
    pub revenue_to_debt_service: Multiple,
}

impl Default for MetricsAssumptions {
    fn default() -> Self {
        Self {
            asset_value_multiple: dec!(1.25),
            revenue_to_debt_service: dec!(1.5),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetricsInput {
    pub principal: Money,
    pub annual_interest_rate_pct: Percent,
    pub term_months: u32,
    pub monthly_payment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_revenue: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_operating_expenses: Option<Money>,
    /// Annual discount rate as a decimal; defaults to the loan rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(default)]
    pub assumptions: MetricsAssumptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    pub net_present_value: Money,
    /// Monthly IRR of the lender's cash flows
    pub internal_rate_of_return: IrrResult,
    /// Nominal annual IRR (monthly x 12), when converged
    pub annualized_irr: Option<Rate>,
    pub debt_service_coverage_ratio: Option<Multiple>,
    pub loan_to_value_ratio: Option<Rate>,
    pub interest_coverage_ratio: Option<Multiple>,
    /// Months for operating income to cover the principal
    pub break_even_point: PaybackPeriod,
    /// Months for payments to return the principal
    pub payback_period: PaybackPeriod,
    pub discounted_payback_period: PaybackPeriod,
    pub profitability_index: Multiple,
    pub return_on_investment: Rate,
    pub annual_debt_service: Money,
    pub total_interest: Money,
    pub asset_value_used: Money,
    pub annual_revenue_used: Money,
    pub discount_rate_used: Rate,
}

/// Compute the full metric set for a lender funding `principal` and
/// receiving `monthly_payment` for `term_months`.
pub fn calculate_investment_metrics(
    input: &InvestmentMetricsInput,
) -> LeaseFinanceResult<ComputationOutput<InvestmentMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let principal = input.principal;
    let payment = input.monthly_payment;
    let months = Decimal::from(input.term_months);
    let cash_flows = vec![payment; input.term_months as usize];

    let annual_debt_service = payment * MONTHS_PER_YEAR;
    let total_interest = payment * months - principal;

    let discount_rate = input
        .discount_rate
        .unwrap_or_else(|| pct_to_rate(input.annual_interest_rate_pct));
    let monthly_discount = discount_rate / MONTHS_PER_YEAR;

    let net_present_value = time_value::npv(principal, &cash_flows, monthly_discount)?;
    let internal_rate_of_return = time_value::irr(principal, &cash_flows);
    if let IrrResult::NotConverged { reason } = internal_rate_of_return {
        warnings.push(match reason {
            NonConvergence::NoSignChange => {
                "IRR undefined: cash flows never change sign within the search bracket".into()
            }
            other => format!("IRR did not converge ({other:?})"),
        });
    }

    let asset_value = input
        .asset_value
        .unwrap_or(principal * input.assumptions.asset_value_multiple);
    let annual_revenue = input
        .annual_revenue
        .unwrap_or(annual_debt_service * input.assumptions.revenue_to_debt_service);
    let operating_expenses = input.annual_operating_expenses.unwrap_or(Decimal::ZERO);
    let net_operating_income = annual_revenue - operating_expenses;

    let debt_service_coverage_ratio = if annual_debt_service.is_zero() {
        None
    } else {
        Some(net_operating_income / annual_debt_service)
    };
    if let Some(dscr) = debt_service_coverage_ratio {
        if dscr < DSCR_WARNING_THRESHOLD {
            warnings.push(format!(
                "DSCR of {} is below {DSCR_WARNING_THRESHOLD}x",
                dscr.round_dp(2)
            ));
        }
    }

    let loan_to_value_ratio = if asset_value <= Decimal::ZERO {
        warnings.push("Asset value is not positive; LTV not computed".into());
        None
    } else {
        Some(principal / asset_value)
    };
    if let Some(ltv) = loan_to_value_ratio {
        if ltv > LTV_WARNING_THRESHOLD {
            warnings.push(format!("LTV of {} exceeds {LTV_WARNING_THRESHOLD}", ltv.round_dp(4)));
        }
    }

    let average_annual_interest = total_interest / (months / MONTHS_PER_YEAR);
    let interest_coverage_ratio = if average_annual_interest <= Decimal::ZERO {
        None
    } else {
        Some(net_operating_income / average_annual_interest)
    };

    let break_even = break_even_point(
        principal,
        annual_revenue / MONTHS_PER_YEAR,
        operating_expenses / MONTHS_PER_YEAR,
    );
    let payback = payback_period(principal, payment);
    let discounted_payback = discounted_payback_period(principal, &cash_flows, monthly_discount)?;

    let output = InvestmentMetrics {
        net_present_value,
        annualized_irr: internal_rate_of_return.annualized(12),
        internal_rate_of_return,
        debt_service_coverage_ratio,
        loan_to_value_ratio,
        interest_coverage_ratio,
        break_even_point: break_even,
        payback_period: payback,
        discounted_payback_period: discounted_payback,
        profitability_index: (net_present_value + principal) / principal,
        return_on_investment: total_interest / principal,
        annual_debt_service,
        total_interest,
        asset_value_used: asset_value,
        annual_revenue_used: annual_revenue,
        discount_rate_used: discount_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lender investment metrics: NPV, IRR (bisection), DSCR, LTV, payback",
        &serde_json::json!({
            "principal": principal.to_string(),
            "monthly_payment": payment.to_string(),
            "term_months": input.term_months,
            "discount_rate": discount_rate.to_string(),
            "asset_value_defaulted": input.asset_value.is_none(),
            "annual_revenue_defaulted": input.annual_revenue.is_none(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &InvestmentMetricsInput) -> LeaseFinanceResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(LeaseFinanceError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    validate_term(input.term_months)?;
    if let Some(rate) = input.discount_rate {
        if rate <= dec!(-12) {
            return Err(LeaseFinanceError::InvalidInput {
                field: "discount_rate".into(),
                reason: "Monthly discount rate must be greater than -100%".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
