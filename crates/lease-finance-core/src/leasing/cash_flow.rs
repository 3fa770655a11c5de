//! Month-by-month lease versus purchase comparison.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LeaseFinanceError;
use crate::types::Money;
use crate::LeaseFinanceResult;

use super::financials::ClientQuotation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasingCashFlowEntry {
    pub month: u32,
    pub date: NaiveDate,
    /// Rent paid by the client this month
    pub lease_payment: Money,
    /// Initial payment plus all rent paid so far
    pub lease_cumulative_cost: Money,
    /// Loan instalment the client would pay when buying instead
    pub purchase_payment: Money,
    /// Down payment plus all instalments paid so far
    pub purchase_cumulative_cost: Money,
    pub lessor_net_cash_flow: Money,
    /// Lessor position after upfront costs
    pub lessor_cumulative_cash_flow: Money,
}

/// One entry per month of the lease. The purchase side finances the same
/// amount at the same client rate, so its instalment equals the base rent.
pub(crate) fn build_cash_flow_schedule(
    start_date: NaiveDate,
    term_months: u32,
    quotation: &ClientQuotation,
    down_payment: Money,
    lessor_upfront_costs: Money,
    lessor_flows: &[Money],
) -> LeaseFinanceResult<Vec<LeasingCashFlowEntry>> {
    let rent = quotation.total_monthly_rent_sans_iva;
    let purchase_payment = quotation.base_monthly_rent;

    let mut lessor_cumulative = -lessor_upfront_costs;
    let mut schedule = Vec::with_capacity(term_months as usize);

    for month in 1..=term_months {
        let date = start_date
            .checked_add_months(Months::new(month))
            .ok_or_else(|| {
                LeaseFinanceError::DateError(format!(
                    "Lease month {month} falls outside the supported calendar range"
                ))
            })?;
        let elapsed = Decimal::from(month);
        let lessor_net = lessor_flows
            .get((month - 1) as usize)
            .copied()
            .unwrap_or(Decimal::ZERO);
        lessor_cumulative += lessor_net;

        schedule.push(LeasingCashFlowEntry {
            month,
            date,
            lease_payment: rent,
            lease_cumulative_cost: quotation.initial_payment_sans_iva + rent * elapsed,
            purchase_payment,
            purchase_cumulative_cost: down_payment + purchase_payment * elapsed,
            lessor_net_cash_flow: lessor_net,
            lessor_cumulative_cash_flow: lessor_cumulative,
        });
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use crate::leasing::financials::{calculate_leasing_financials, LeasingInputs};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn inputs() -> LeasingInputs {
        LeasingInputs {
            asset_cost: dec!(12000),
            other_expenses: dec!(200),
            monthly_expenses: Decimal::ZERO,
            lessor_profit_margin_pct: dec!(20),
            fixed_monthly_fee: Decimal::ZERO,
            admin_commission_pct: dec!(1),
            security_deposit_months: dec!(2),
            delivery_costs: dec!(150),
            residual_value_rate: Decimal::ZERO,
            discount_rate_pct: Decimal::ZERO,
            term_months: 12,
            down_payment: dec!(2000),
            client_annual_rate_pct: Decimal::ZERO,
            investor_loan_amount: dec!(10000),
            investor_annual_interest_rate_pct: Decimal::ZERO,
            lessor_retains_residual: false,
        }
    }

    #[test]
    fn test_cumulative_costs() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let out = calculate_leasing_financials(&inputs(), start).unwrap();
        let r = &out.result;
        let schedule = &r.cash_flow_schedule;
        assert_eq!(schedule.len(), 12);

        // Zero client rate: base rent = 10000 / 12, purchase side uses it
        let base = dec!(10000) / dec!(12);
        let first = &schedule[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(first.purchase_payment, base);
        assert_eq!(first.purchase_cumulative_cost, dec!(2000) + base);
        assert_eq!(
            first.lease_cumulative_cost,
            r.initial_payment_sans_iva + r.total_monthly_rent_sans_iva
        );

        let last = &schedule[11];
        assert_eq!(
            last.lease_cumulative_cost,
            r.initial_payment_sans_iva + r.total_monthly_rent_sans_iva * dec!(12)
        );
        assert_eq!(last.purchase_cumulative_cost, dec!(2000) + base * dec!(12));
    }

    #[test]
    fn test_lessor_position_ends_at_total_profit() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let out = calculate_leasing_financials(&inputs(), start).unwrap();
        let r = &out.result;
        let last = r.cash_flow_schedule.last().unwrap();
        let diff = (last.lessor_cumulative_cash_flow - r.profitability.total_profit).abs();
        assert!(diff < dec!(0.000001));
        assert_eq!(
            r.cash_flow_schedule[0].lessor_cumulative_cash_flow,
            dec!(-200) + r.profitability.gross_monthly_margin
        );
    }
}
