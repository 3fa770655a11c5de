//! Equipment / vehicle leasing deal structuring.
//!
//! Three sub-models are computed independently and then combined:
//! the client quotation (what the lessee pays), the lessor's cost of
//! funding the asset through an investor loan, and the resulting
//! profitability of the deal.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{calculate_monthly_payment, validate_term};
use crate::error::LeaseFinanceError;
use crate::metrics::{cumulative_break_even, PaybackPeriod};
use crate::time_value::{self, IrrResult};
use crate::types::*;
use crate::LeaseFinanceResult;

use super::cash_flow::{build_cash_flow_schedule, LeasingCashFlowEntry};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Business parameters of a leasing deal. No value is clamped; ranges are
/// enforced by whoever collects the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasingInputs {
    /// Purchase price of the leased asset
    pub asset_cost: Money,
    /// One-off lessor expenses (registration, insurance set-up, ...)
    #[serde(default)]
    pub other_expenses: Money,
    /// Recurring lessor expenses per month
    #[serde(default)]
    pub monthly_expenses: Money,
    pub lessor_profit_margin_pct: Percent,
    #[serde(default)]
    pub fixed_monthly_fee: Money,
    #[serde(default)]
    pub admin_commission_pct: Percent,
    /// Security deposit expressed in months of rent
    #[serde(default)]
    pub security_deposit_months: Decimal,
    #[serde(default)]
    pub delivery_costs: Money,
    /// Residual value as a percent of asset cost
    #[serde(default)]
    pub residual_value_rate: Percent,
    /// Annual discount rate applied to the lessor's margins
    #[serde(default)]
    pub discount_rate_pct: Percent,
    pub term_months: u32,
    /// Client down payment, deducted from the amount the rent amortises
    #[serde(default)]
    pub down_payment: Money,
    /// Annual rate used to build the client's base rent
    pub client_annual_rate_pct: Percent,
    /// Amount the lessor borrows from investors to buy the asset
    pub investor_loan_amount: Money,
    pub investor_annual_interest_rate_pct: Percent,
    /// Whether the residual value accrues to the lessor at lease end
    #[serde(default)]
    pub lessor_retains_residual: bool,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// What the client is quoted (amounts before VAT).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientQuotation {
    pub financed_amount: Money,
    pub base_monthly_rent: Money,
    pub margin_amount: Money,
    pub fixed_monthly_fee: Money,
    pub total_monthly_rent_sans_iva: Money,
    pub admin_commission: Money,
    pub security_deposit: Money,
    pub delivery_costs: Money,
    pub initial_payment_sans_iva: Money,
    pub total_rent_collected: Money,
}

/// The lessor's cost of carrying the asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessorCost {
    pub investor_loan_amount: Money,
    pub monthly_loan_payment: Money,
    pub monthly_operating_expenses: Money,
    pub total_monthly_cost: Money,
    pub total_loan_repayment: Money,
    pub total_loan_interest: Money,
    pub upfront_costs: Money,
    pub total_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    pub gross_monthly_margin: Money,
    pub residual_value_captured: Money,
    pub total_profit: Money,
    /// Total profit over total rent collected, in percent
    pub profit_margin_percentage: Percent,
    /// NPV of the lessor's monthly margins at the deal discount rate
    pub net_present_value: Money,
    /// Monthly IRR of the lessor's position
    pub internal_rate_of_return: IrrResult,
    pub annualized_irr: Option<Rate>,
    /// Month in which the lessor's cumulative position turns positive
    pub break_even_month: PaybackPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasingResult {
    pub initial_payment_sans_iva: Money,
    pub total_monthly_rent_sans_iva: Money,
    pub monthly_loan_payment: Money,
    pub residual_value_amount: Money,
    pub client_quotation: ClientQuotation,
    pub lessor_cost: LessorCost,
    pub profitability: Profitability,
    pub cash_flow_schedule: Vec<LeasingCashFlowEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a leasing deal: client rent and upfront payment, lessor funding
/// cost, profitability and the month-by-month lease-vs-purchase schedule.
///
/// Rejects a non-positive asset cost or a zero term instead of returning a
/// zeroed result.
pub fn calculate_leasing_financials(
    inputs: &LeasingInputs,
    start_date: NaiveDate,
) -> LeaseFinanceResult<ComputationOutput<LeasingResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(inputs)?;

    let client_quotation = quote_client(inputs)?;
    let lessor_cost = cost_lessor(inputs)?;
    let residual_value_amount = inputs.asset_cost * pct_to_rate(inputs.residual_value_rate);

    let residual_value_captured = if inputs.lessor_retains_residual {
        residual_value_amount
    } else {
        Decimal::ZERO
    };

    let gross_monthly_margin =
        client_quotation.total_monthly_rent_sans_iva - lessor_cost.total_monthly_cost;
    let months = Decimal::from(inputs.term_months);
    let total_profit =
        gross_monthly_margin * months + residual_value_captured - inputs.other_expenses;
    let profit_margin_percentage = if client_quotation.total_rent_collected.is_zero() {
        Decimal::ZERO
    } else {
        total_profit / client_quotation.total_rent_collected * dec!(100)
    };

    // Lessor position: upfront costs out, margins in, residual at the end
    let mut lessor_flows = vec![gross_monthly_margin; inputs.term_months as usize];
    if let Some(last) = lessor_flows.last_mut() {
        *last += residual_value_captured;
    }
    let monthly_discount = pct_to_rate(inputs.discount_rate_pct) / dec!(12);
    let net_present_value =
        time_value::npv(inputs.other_expenses, &lessor_flows, monthly_discount)?;
    let internal_rate_of_return = time_value::irr(inputs.other_expenses, &lessor_flows);
    let break_even_month = cumulative_break_even(inputs.other_expenses, &lessor_flows);

    let cash_flow_schedule = build_cash_flow_schedule(
        start_date,
        inputs.term_months,
        &client_quotation,
        inputs.down_payment,
        inputs.other_expenses,
        &lessor_flows,
    )?;

    if gross_monthly_margin < Decimal::ZERO {
        warnings.push(format!(
            "Monthly rent ({}) does not cover the lessor's monthly cost ({})",
            client_quotation.total_monthly_rent_sans_iva.round_dp(2),
            lessor_cost.total_monthly_cost.round_dp(2)
        ));
    }
    if residual_value_amount > inputs.asset_cost {
        warnings.push("Residual value exceeds the asset cost".into());
    }
    if inputs.down_payment == inputs.asset_cost {
        warnings.push("Down payment covers the full asset cost; base rent is zero".into());
    }
    if inputs.investor_loan_amount > inputs.asset_cost + inputs.other_expenses {
        warnings.push("Investor loan exceeds the asset cost plus upfront expenses".into());
    }

    let output = LeasingResult {
        initial_payment_sans_iva: client_quotation.initial_payment_sans_iva,
        total_monthly_rent_sans_iva: client_quotation.total_monthly_rent_sans_iva,
        monthly_loan_payment: lessor_cost.monthly_loan_payment,
        residual_value_amount,
        profitability: Profitability {
            gross_monthly_margin,
            residual_value_captured,
            total_profit,
            profit_margin_percentage,
            net_present_value,
            annualized_irr: internal_rate_of_return.annualized(12),
            internal_rate_of_return,
            break_even_month,
        },
        client_quotation,
        lessor_cost,
        cash_flow_schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Leasing deal: client quotation, lessor funding cost, profitability",
        &serde_json::json!({
            "asset_cost": inputs.asset_cost.to_string(),
            "term_months": inputs.term_months,
            "client_annual_rate_pct": inputs.client_annual_rate_pct.to_string(),
            "investor_annual_interest_rate_pct": inputs.investor_annual_interest_rate_pct.to_string(),
            "lessor_retains_residual": inputs.lessor_retains_residual,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Client-facing rent and upfront payment. A down payment outside
/// `0..=asset_cost` is rejected so no quoted amount goes negative.
pub fn quote_client(inputs: &LeasingInputs) -> LeaseFinanceResult<ClientQuotation> {
    if inputs.down_payment < Decimal::ZERO || inputs.down_payment > inputs.asset_cost {
        return Err(LeaseFinanceError::InvalidInput {
            field: "down_payment".into(),
            reason: format!(
                "Down payment must be between 0 and the asset cost ({})",
                inputs.asset_cost
            ),
        });
    }
    let financed_amount = inputs.asset_cost - inputs.down_payment;
    let base_monthly_rent = calculate_monthly_payment(
        financed_amount,
        inputs.client_annual_rate_pct,
        inputs.term_months,
    )?;
    let margin_amount = base_monthly_rent * pct_to_rate(inputs.lessor_profit_margin_pct);
    let total_monthly_rent_sans_iva = base_monthly_rent + margin_amount + inputs.fixed_monthly_fee;

    let admin_commission = inputs.asset_cost * pct_to_rate(inputs.admin_commission_pct);
    let security_deposit = total_monthly_rent_sans_iva * inputs.security_deposit_months;
    let initial_payment_sans_iva = admin_commission + security_deposit + inputs.delivery_costs;

    Ok(ClientQuotation {
        financed_amount,
        base_monthly_rent,
        margin_amount,
        fixed_monthly_fee: inputs.fixed_monthly_fee,
        total_monthly_rent_sans_iva,
        admin_commission,
        security_deposit,
        delivery_costs: inputs.delivery_costs,
        initial_payment_sans_iva,
        total_rent_collected: total_monthly_rent_sans_iva * Decimal::from(inputs.term_months),
    })
}

/// Lessor funding cost from the investor loan plus operating expenses.
pub fn cost_lessor(inputs: &LeasingInputs) -> LeaseFinanceResult<LessorCost> {
    let monthly_loan_payment = calculate_monthly_payment(
        inputs.investor_loan_amount,
        inputs.investor_annual_interest_rate_pct,
        inputs.term_months,
    )?;
    let months = Decimal::from(inputs.term_months);
    let total_monthly_cost = monthly_loan_payment + inputs.monthly_expenses;
    let total_loan_repayment = monthly_loan_payment * months;

    Ok(LessorCost {
        investor_loan_amount: inputs.investor_loan_amount,
        monthly_loan_payment,
        monthly_operating_expenses: inputs.monthly_expenses,
        total_monthly_cost,
        total_loan_repayment,
        total_loan_interest: total_loan_repayment - inputs.investor_loan_amount,
        upfront_costs: inputs.other_expenses,
        total_cost: total_monthly_cost * months + inputs.other_expenses,
    })
}

fn validate_input(inputs: &LeasingInputs) -> LeaseFinanceResult<()> {
    if inputs.asset_cost <= Decimal::ZERO {
        return Err(LeaseFinanceError::InvalidInput {
            field: "asset_cost".into(),
            reason: "Asset cost must be positive".into(),
        });
    }
    validate_term(inputs.term_months)?;
    if pct_to_rate(inputs.discount_rate_pct) / dec!(12) <= dec!(-1) {
        return Err(LeaseFinanceError::InvalidInput {
            field: "discount_rate_pct".into(),
            reason: "Monthly discount rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn van_lease() -> LeasingInputs {
        LeasingInputs {
            asset_cost: dec!(30000),
            other_expenses: dec!(500),
            monthly_expenses: dec!(50),
            lessor_profit_margin_pct: dec!(15),
            fixed_monthly_fee: dec!(25),
            admin_commission_pct: dec!(2),
            security_deposit_months: dec!(1),
            delivery_costs: dec!(300),
            residual_value_rate: dec!(10),
            discount_rate_pct: dec!(8),
            term_months: 36,
            down_payment: dec!(3000),
            client_annual_rate_pct: dec!(9),
            investor_loan_amount: dec!(27000),
            investor_annual_interest_rate_pct: dec!(6),
            lessor_retains_residual: true,
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_client_quotation_composition() {
        let q = quote_client(&van_lease()).unwrap();
        assert_eq!(q.financed_amount, dec!(27000));
        let expected_base = calculate_monthly_payment(dec!(27000), dec!(9), 36).unwrap();
        assert_eq!(q.base_monthly_rent, expected_base);
        assert_eq!(
            q.total_monthly_rent_sans_iva,
            expected_base + expected_base * dec!(0.15) + dec!(25)
        );
        assert_eq!(q.admin_commission, dec!(600));
        assert_eq!(q.security_deposit, q.total_monthly_rent_sans_iva);
        assert_eq!(
            q.initial_payment_sans_iva,
            dec!(600) + q.total_monthly_rent_sans_iva + dec!(300)
        );
    }

    #[test]
    fn test_lessor_cost() {
        let c = cost_lessor(&van_lease()).unwrap();
        let loan = calculate_monthly_payment(dec!(27000), dec!(6), 36).unwrap();
        assert_eq!(c.monthly_loan_payment, loan);
        assert_eq!(c.total_monthly_cost, loan + dec!(50));
        assert_eq!(c.total_loan_interest, loan * dec!(36) - dec!(27000));
    }

    #[test]
    fn test_profitability() {
        let out = calculate_leasing_financials(&van_lease(), start()).unwrap();
        let r = &out.result;
        let p = &r.profitability;
        assert_eq!(r.residual_value_amount, dec!(3000));
        assert_eq!(
            p.gross_monthly_margin,
            r.total_monthly_rent_sans_iva - r.lessor_cost.total_monthly_cost
        );
        assert_eq!(
            p.total_profit,
            p.gross_monthly_margin * dec!(36) + dec!(3000) - dec!(500)
        );
        assert!(p.gross_monthly_margin > Decimal::ZERO);
        assert!(p.profit_margin_percentage > Decimal::ZERO);
        assert!(p.internal_rate_of_return.is_converged());
        assert!(matches!(p.break_even_month, PaybackPeriod::Periods { .. }));
    }

    #[test]
    fn test_residual_not_retained() {
        let mut inputs = van_lease();
        inputs.lessor_retains_residual = false;
        let out = calculate_leasing_financials(&inputs, start()).unwrap();
        let p = &out.result.profitability;
        assert_eq!(p.residual_value_captured, Decimal::ZERO);
        assert_eq!(p.total_profit, p.gross_monthly_margin * dec!(36) - dec!(500));
    }

    #[test]
    fn test_non_negative_payments_for_non_negative_inputs() {
        let mut inputs = van_lease();
        inputs.down_payment = Decimal::ZERO;
        inputs.lessor_profit_margin_pct = Decimal::ZERO;
        inputs.client_annual_rate_pct = Decimal::ZERO;
        let out = calculate_leasing_financials(&inputs, start()).unwrap();
        assert!(out.result.initial_payment_sans_iva >= Decimal::ZERO);
        assert!(out.result.total_monthly_rent_sans_iva >= Decimal::ZERO);
        // 30000 / 36 + 25
        assert_eq!(
            out.result.total_monthly_rent_sans_iva,
            dec!(30000) / dec!(36) + dec!(25)
        );
    }

    #[test]
    fn test_zero_asset_cost_rejected() {
        let mut inputs = van_lease();
        inputs.asset_cost = Decimal::ZERO;
        assert!(matches!(
            calculate_leasing_financials(&inputs, start()),
            Err(LeaseFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_zero_term_rejected() {
        let mut inputs = van_lease();
        inputs.term_months = 0;
        assert!(calculate_leasing_financials(&inputs, start()).is_err());
    }

    #[test]
    fn test_down_payment_above_cost_rejected() {
        let mut inputs = van_lease();
        inputs.down_payment = dec!(30000.01);
        match calculate_leasing_financials(&inputs, start()) {
            Err(LeaseFinanceError::InvalidInput { field, .. }) => {
                assert_eq!(field, "down_payment")
            }
            other => panic!("expected InvalidInput on down_payment, got {other:?}"),
        }
        assert!(quote_client(&inputs).is_err());
    }

    #[test]
    fn test_down_payment_equal_to_cost_quotes_zero_base_rent() {
        let mut inputs = van_lease();
        inputs.down_payment = dec!(30000);
        let out = calculate_leasing_financials(&inputs, start()).unwrap();
        let q = &out.result.client_quotation;
        assert_eq!(q.financed_amount, Decimal::ZERO);
        assert_eq!(q.base_monthly_rent, Decimal::ZERO);
        assert!(q.total_monthly_rent_sans_iva >= Decimal::ZERO);
        assert!(q.security_deposit >= Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("Down payment covers")));
    }

    #[test]
    fn test_term_above_cap_rejected() {
        let mut inputs = van_lease();
        inputs.term_months = 4_000_000_000;
        assert!(matches!(
            calculate_leasing_financials(&inputs, start()),
            Err(LeaseFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_negative_margin_warns() {
        let mut inputs = van_lease();
        inputs.investor_annual_interest_rate_pct = dec!(30);
        inputs.lessor_profit_margin_pct = Decimal::ZERO;
        let out = calculate_leasing_financials(&inputs, start()).unwrap();
        assert!(out.result.profitability.gross_monthly_margin < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("does not cover")));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "asset_cost": "20000",
            "lessor_profit_margin_pct": "10",
            "term_months": 24,
            "client_annual_rate_pct": "8",
            "investor_loan_amount": "20000",
            "investor_annual_interest_rate_pct": "5"
        }"#;
        let inputs: LeasingInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.delivery_costs, Decimal::ZERO);
        assert!(!inputs.lessor_retains_residual);
        let out = calculate_leasing_financials(&inputs, start()).unwrap();
        assert_eq!(out.result.cash_flow_schedule.len(), 24);
    }
}
