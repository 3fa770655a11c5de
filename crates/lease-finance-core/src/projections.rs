//! Forward-looking performance series built by geometric compounding.
//!
//! These feed dashboards; they are deterministic extrapolations, not
//! forecasts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::periodic_payment;
use crate::error::LeaseFinanceError;
use crate::time_value;
use crate::types::*;
use crate::LeaseFinanceResult;

const QUARTERS_PER_YEAR: u32 = 4;

/// Longest projection horizon accepted, in years.
pub const MAX_PROJECTION_YEARS: u32 = 100;

fn check_horizon(years: u32) -> LeaseFinanceResult<()> {
    if years > MAX_PROJECTION_YEARS {
        return Err(LeaseFinanceError::InvalidInput {
            field: "years".into(),
            reason: format!("Projection horizon cannot exceed {MAX_PROJECTION_YEARS} years"),
        });
    }
    Ok(())
}

fn overflowed(field: &str, period: &str) -> LeaseFinanceError {
    LeaseFinanceError::InvalidInput {
        field: field.into(),
        reason: format!("Projected {field} exceeds the decimal range in {period}"),
    }
}

// ---------------------------------------------------------------------------
// Annual projections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProjection {
    /// 1-based year
    pub period: u32,
    pub cash_flow: Money,
    /// Present value of this period's cash flow
    pub net_present_value: Money,
    /// `-principal` plus the present values of all cash flows so far
    pub cumulative_npv: Money,
    /// `(cumulative cash flow - principal) / principal`
    pub roi: Rate,
    /// IRR of the flows up to this period; `None` until it exists
    pub irr: Option<Rate>,
}

/// Year-by-year projection of a cash flow growing at `annual_growth_rate`
/// and discounted at `discount_rate` (both decimals).
pub fn generate_financial_projections(
    principal: Money,
    base_cash_flow: Money,
    annual_growth_rate: Rate,
    discount_rate: Rate,
    years: u32,
) -> LeaseFinanceResult<Vec<FinancialProjection>> {
    if principal <= Decimal::ZERO {
        return Err(LeaseFinanceError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if discount_rate <= dec!(-1) {
        return Err(LeaseFinanceError::InvalidInput {
            field: "discount_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    check_horizon(years)?;

    let growth = Decimal::ONE + annual_growth_rate;
    let discount = Decimal::ONE / (Decimal::ONE + discount_rate);

    let mut projections = Vec::with_capacity(years as usize);
    let mut flows: Vec<Money> = Vec::with_capacity(years as usize);
    let mut cash_flow = base_cash_flow;
    let mut cumulative_cash = Decimal::ZERO;
    let mut factor = Decimal::ONE;
    let mut cumulative_npv = -principal;

    for period in 1..=years {
        let year = format!("year {period}");
        if period > 1 {
            cash_flow = cash_flow
                .checked_mul(growth)
                .ok_or_else(|| overflowed("cash_flow", &year))?;
        }
        factor = factor
            .checked_mul(discount)
            .ok_or_else(|| overflowed("discount_factor", &year))?;
        let present_value = cash_flow
            .checked_mul(factor)
            .ok_or_else(|| overflowed("net_present_value", &year))?;
        cumulative_npv = cumulative_npv
            .checked_add(present_value)
            .ok_or_else(|| overflowed("cumulative_npv", &year))?;
        cumulative_cash = cumulative_cash
            .checked_add(cash_flow)
            .ok_or_else(|| overflowed("cumulative_cash_flow", &year))?;
        flows.push(cash_flow);

        projections.push(FinancialProjection {
            period,
            cash_flow,
            net_present_value: present_value,
            cumulative_npv,
            roi: (cumulative_cash - principal) / principal,
            irr: time_value::irr(principal, &flows).rate(),
        });
    }

    Ok(projections)
}

// ---------------------------------------------------------------------------
// Quarterly performance
// ---------------------------------------------------------------------------

/// Treatment of the running capital reserve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveFloor {
    /// Reserves may go negative
    #[default]
    Unbounded,
    /// Reserves never drop below zero
    Zero,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterlyPerformanceInput {
    pub principal: Money,
    pub annual_revenue: Money,
    pub annual_expenses: Money,
    /// Growth per quarter as a decimal (0.02 = 2%)
    pub quarterly_growth_rate: Rate,
    pub years: u32,
    /// Rate on the principal used for quarterly debt servicing
    #[serde(default)]
    pub annual_interest_rate_pct: Percent,
    #[serde(default)]
    pub reserve_floor: ReserveFloor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyPerformance {
    /// 1-based quarter index across the whole horizon
    pub quarter: u32,
    /// e.g. "Y2 Q3"
    pub label: String,
    pub revenue: Money,
    pub expenses: Money,
    pub net_income: Money,
    pub cash_flow: Money,
    pub debt_servicing: Money,
    /// Cumulative growth over the first quarter, as a decimal
    pub projected_growth: Rate,
    pub capital_reserves: Money,
}

/// Quarter-by-quarter revenue, expenses and reserves. Revenue and expenses
/// compound at the quarterly growth rate; debt is serviced by a level
/// quarterly payment that retires the principal over the horizon.
pub fn generate_quarterly_performance(
    input: &QuarterlyPerformanceInput,
) -> LeaseFinanceResult<Vec<QuarterlyPerformance>> {
    if input.years == 0 {
        return Err(LeaseFinanceError::InvalidInput {
            field: "years".into(),
            reason: "Projection horizon must be at least 1 year".into(),
        });
    }
    check_horizon(input.years)?;

    let quarters = input.years * QUARTERS_PER_YEAR;
    let debt_servicing = periodic_payment(
        input.principal,
        input.annual_interest_rate_pct,
        input.years * 12,
        PaymentFrequency::Quarterly,
    )?;

    let growth = Decimal::ONE + input.quarterly_growth_rate;
    let quarters_per_year = Decimal::from(QUARTERS_PER_YEAR);
    let mut revenue = input.annual_revenue / quarters_per_year;
    let mut expenses = input.annual_expenses / quarters_per_year;
    let mut compounded = Decimal::ONE;
    let mut capital_reserves = Decimal::ZERO;

    let mut series = Vec::with_capacity(quarters as usize);
    for quarter in 1..=quarters {
        let label = format!(
            "Y{} Q{}",
            (quarter - 1) / QUARTERS_PER_YEAR + 1,
            (quarter - 1) % QUARTERS_PER_YEAR + 1
        );
        if quarter > 1 {
            revenue = revenue
                .checked_mul(growth)
                .ok_or_else(|| overflowed("revenue", &label))?;
            expenses = expenses
                .checked_mul(growth)
                .ok_or_else(|| overflowed("expenses", &label))?;
            compounded = compounded
                .checked_mul(growth)
                .ok_or_else(|| overflowed("projected_growth", &label))?;
        }
        let net_income = revenue
            .checked_sub(expenses)
            .ok_or_else(|| overflowed("net_income", &label))?;
        let cash_flow = net_income
            .checked_sub(debt_servicing)
            .ok_or_else(|| overflowed("cash_flow", &label))?;

        capital_reserves = capital_reserves
            .checked_add(cash_flow)
            .ok_or_else(|| overflowed("capital_reserves", &label))?;
        if input.reserve_floor == ReserveFloor::Zero && capital_reserves < Decimal::ZERO {
            capital_reserves = Decimal::ZERO;
        }

        series.push(QuarterlyPerformance {
            quarter,
            label,
            revenue,
            expenses,
            net_income,
            cash_flow,
            debt_servicing,
            projected_growth: compounded - Decimal::ONE,
            capital_reserves,
        });
    }

    Ok(series)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quarterly_input() -> QuarterlyPerformanceInput {
        QuarterlyPerformanceInput {
            principal: dec!(100000),
            annual_revenue: dec!(200000),
            annual_expenses: dec!(120000),
            quarterly_growth_rate: dec!(0.02),
            years: 2,
            annual_interest_rate_pct: dec!(8),
            reserve_floor: ReserveFloor::Unbounded,
        }
    }

    #[test]
    fn test_projection_compounding() {
        let p = generate_financial_projections(dec!(1000), dec!(100), dec!(0.10), dec!(0.08), 3)
            .unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p[0].cash_flow, dec!(100));
        assert_eq!(p[1].cash_flow, dec!(110.0));
        assert_eq!(p[2].cash_flow, dec!(121.00));
        assert_eq!(p[0].roi, dec!(-0.9));
    }

    #[test]
    fn test_projection_cumulative_npv_matches_npv() {
        let p = generate_financial_projections(dec!(1000), dec!(300), dec!(0.05), dec!(0.10), 5)
            .unwrap();
        let flows: Vec<Money> = p.iter().map(|r| r.cash_flow).collect();
        let npv = time_value::npv(dec!(1000), &flows, dec!(0.10)).unwrap();
        assert!((p[4].cumulative_npv - npv).abs() < dec!(0.000001));
    }

    #[test]
    fn test_projection_irr_appears_once_recovered() {
        let p = generate_financial_projections(dec!(1000), dec!(400), Decimal::ZERO, dec!(0.1), 4)
            .unwrap();
        // Still a loss after two years but IRR is defined (negative)
        assert!(p[1].irr.unwrap() < Decimal::ZERO);
        assert!(p[3].irr.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_projection_rejects_non_positive_principal() {
        assert!(
            generate_financial_projections(Decimal::ZERO, dec!(1), dec!(0), dec!(0), 1).is_err()
        );
    }

    #[test]
    fn test_quarterly_growth_and_labels() {
        let q = generate_quarterly_performance(&quarterly_input()).unwrap();
        assert_eq!(q.len(), 8);
        assert_eq!(q[0].label, "Y1 Q1");
        assert_eq!(q[4].label, "Y2 Q1");
        assert_eq!(q[0].revenue, dec!(50000));
        assert_eq!(q[1].revenue, dec!(51000.00));
        assert_eq!(q[0].projected_growth, Decimal::ZERO);
        assert_eq!(q[1].projected_growth, dec!(0.02));
        for row in &q {
            assert_eq!(row.net_income, row.revenue - row.expenses);
            assert_eq!(row.cash_flow, row.net_income - row.debt_servicing);
        }
    }

    #[test]
    fn test_quarterly_debt_service_retires_principal() {
        let q = generate_quarterly_performance(&quarterly_input()).unwrap();
        let expected =
            periodic_payment(dec!(100000), dec!(8), 24, PaymentFrequency::Quarterly).unwrap();
        assert!(q.iter().all(|row| row.debt_servicing == expected));
    }

    #[test]
    fn test_reserves_accumulate() {
        let q = generate_quarterly_performance(&quarterly_input()).unwrap();
        let mut running = Decimal::ZERO;
        for row in &q {
            running += row.cash_flow;
            assert_eq!(row.capital_reserves, running);
        }
    }

    #[test]
    fn test_projection_overflow_is_an_error() {
        // Doubling every year for a century leaves the decimal range
        let err = generate_financial_projections(
            dec!(100000),
            dec!(10000),
            dec!(1.0),
            dec!(0.08),
            100,
        )
        .unwrap_err();
        assert!(matches!(err, LeaseFinanceError::InvalidInput { .. }));
    }

    #[test]
    fn test_quarterly_overflow_is_an_error() {
        let mut input = quarterly_input();
        input.quarterly_growth_rate = dec!(0.5);
        input.years = 50;
        assert!(matches!(
            generate_quarterly_performance(&input),
            Err(LeaseFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_horizon_above_cap_rejected() {
        let over = MAX_PROJECTION_YEARS + 1;
        assert!(
            generate_financial_projections(dec!(1000), dec!(100), dec!(0), dec!(0.05), over)
                .is_err()
        );
        let mut input = quarterly_input();
        input.years = MAX_PROJECTION_YEARS + 1;
        assert!(generate_quarterly_performance(&input).is_err());
    }

    #[test]
    fn test_reserve_floor_at_zero() {
        let mut input = quarterly_input();
        input.annual_revenue = dec!(100000);
        let unbounded = generate_quarterly_performance(&input).unwrap();
        assert!(unbounded[0].capital_reserves < Decimal::ZERO);

        input.reserve_floor = ReserveFloor::Zero;
        let floored = generate_quarterly_performance(&input).unwrap();
        assert!(floored.iter().all(|row| row.capital_reserves >= Decimal::ZERO));
    }
}
