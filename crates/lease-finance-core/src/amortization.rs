//! Level-payment (annuity) loan amortization.
//!
//! Splits each payment into interest on the outstanding balance and
//! principal repayment. The final period absorbs any decimal residue so the
//! principal column sums exactly to the amount financed and the closing
//! balance is exactly zero.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LeaseFinanceError;
use crate::time_value::annuity_payment;
use crate::types::{pct_to_rate, Money, PaymentFrequency, Percent, Rate};
use crate::LeaseFinanceResult;

/// Longest term accepted, in months.
pub const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parameters of an amortizing loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Amount financed
    pub principal: Money,
    /// Nominal annual interest rate in percent (10 = 10%)
    pub annual_interest_rate_pct: Percent,
    /// Total term in months; must be a multiple of the frequency's months per period
    pub term_months: u32,
    /// Loan start; the first payment falls one period later
    pub start_date: NaiveDate,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
}

/// One row of the repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleEntry {
    /// 1-based payment index
    pub payment_number: u32,
    pub date: NaiveDate,
    /// Level payment (identical on every row)
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Outstanding principal after this payment
    pub balance: Money,
}

/// Totals over a full schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub number_of_payments: u32,
    pub periodic_payment: Money,
    pub total_paid: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    pub final_payment_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Periodic interest rate: annual percent / 100 / periods per year.
pub fn periodic_rate(annual_rate_pct: Percent, frequency: PaymentFrequency) -> Rate {
    pct_to_rate(annual_rate_pct) / Decimal::from(frequency.periods_per_year())
}

/// Reject terms outside `1..=MAX_TERM_MONTHS`.
pub fn validate_term(term_months: u32) -> LeaseFinanceResult<()> {
    if term_months == 0 {
        return Err(LeaseFinanceError::InvalidInput {
            field: "term_months".into(),
            reason: "Term must be at least 1 month".into(),
        });
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(LeaseFinanceError::InvalidInput {
            field: "term_months".into(),
            reason: format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
        });
    }
    Ok(())
}

/// Number of payments for a term, rejecting terms that do not divide evenly.
pub fn number_of_periods(
    term_months: u32,
    frequency: PaymentFrequency,
) -> LeaseFinanceResult<u32> {
    validate_term(term_months)?;
    let months_per_period = frequency.months_per_period();
    if term_months % months_per_period != 0 {
        return Err(LeaseFinanceError::InvalidTerm {
            term_months,
            months_per_period,
        });
    }
    Ok(term_months / months_per_period)
}

/// Level payment per period for any frequency.
pub fn periodic_payment(
    principal: Money,
    annual_rate_pct: Percent,
    term_months: u32,
    frequency: PaymentFrequency,
) -> LeaseFinanceResult<Money> {
    let n = number_of_periods(term_months, frequency)?;
    annuity_payment(principal, periodic_rate(annual_rate_pct, frequency), n)
}

/// Monthly level payment.
pub fn calculate_monthly_payment(
    principal: Money,
    annual_rate_pct: Percent,
    term_months: u32,
) -> LeaseFinanceResult<Money> {
    periodic_payment(principal, annual_rate_pct, term_months, PaymentFrequency::Monthly)
}

/// Build the full repayment schedule.
///
/// Fails with [`LeaseFinanceError::InvalidTerm`] before any computation when
/// `term_months` is not a multiple of the frequency's months per period.
pub fn generate_schedule(
    principal: Money,
    annual_rate_pct: Percent,
    term_months: u32,
    start_date: NaiveDate,
    frequency: PaymentFrequency,
) -> LeaseFinanceResult<Vec<PaymentScheduleEntry>> {
    let n = number_of_periods(term_months, frequency)?;
    let rate = periodic_rate(annual_rate_pct, frequency);
    let payment = annuity_payment(principal, rate, n)?;
    let months_per_period = frequency.months_per_period();

    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = principal;

    for payment_number in 1..=n {
        let date = start_date
            .checked_add_months(Months::new(payment_number * months_per_period))
            .ok_or_else(|| {
                LeaseFinanceError::DateError(format!(
                    "Payment {payment_number} falls outside the supported calendar range"
                ))
            })?;

        let interest = balance * rate;
        let principal_part = if payment_number == n {
            balance
        } else {
            payment - interest
        };
        balance = if payment_number == n {
            Decimal::ZERO
        } else {
            balance - principal_part
        };

        schedule.push(PaymentScheduleEntry {
            payment_number,
            date,
            payment,
            principal: principal_part,
            interest,
            balance,
        });
    }

    tracing::debug!(
        periods = n,
        payment = %payment,
        "generated amortization schedule"
    );

    Ok(schedule)
}

/// Struct-driven entry point for [`generate_schedule`].
pub fn generate_loan_schedule(
    params: &LoanParameters,
) -> LeaseFinanceResult<Vec<PaymentScheduleEntry>> {
    generate_schedule(
        params.principal,
        params.annual_interest_rate_pct,
        params.term_months,
        params.start_date,
        params.payment_frequency,
    )
}

pub fn summarize_schedule(schedule: &[PaymentScheduleEntry]) -> ScheduleSummary {
    let total_principal: Money = schedule.iter().map(|e| e.principal).sum();
    let total_interest: Money = schedule.iter().map(|e| e.interest).sum();
    ScheduleSummary {
        number_of_payments: schedule.len() as u32,
        periodic_payment: schedule.first().map(|e| e.payment).unwrap_or_default(),
        total_paid: total_principal + total_interest,
        total_principal,
        total_interest,
        final_payment_date: schedule.last().map(|e| e.date),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_zero_rate_schedule() {
        let schedule =
            generate_schedule(dec!(10000), Decimal::ZERO, 10, start(), PaymentFrequency::Monthly)
                .unwrap();
        assert_eq!(schedule.len(), 10);
        for entry in &schedule {
            assert_eq!(entry.payment, dec!(1000));
            assert_eq!(entry.interest, Decimal::ZERO);
            assert_eq!(entry.principal, dec!(1000));
        }
        assert_eq!(schedule[9].balance, Decimal::ZERO);
    }

    #[test]
    fn test_first_period_split() {
        let schedule =
            generate_schedule(dec!(100000), dec!(10), 36, start(), PaymentFrequency::Monthly)
                .unwrap();
        let first = &schedule[0];
        assert!((first.payment - dec!(3226.72)).abs() < dec!(0.01));
        assert!((first.interest - dec!(833.33)).abs() < dec!(0.01));
        assert!((first.principal - dec!(2393.39)).abs() < dec!(0.01));
        assert!((first.balance - dec!(97606.61)).abs() < dec!(0.01));
    }

    #[test]
    fn test_dates_advance_by_period() {
        let schedule =
            generate_schedule(dec!(1200), dec!(6), 12, start(), PaymentFrequency::Quarterly)
                .unwrap();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0].date, NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
        assert_eq!(schedule[3].date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_month_end_dates_clamp() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let schedule =
            generate_schedule(dec!(1000), dec!(5), 2, jan31, PaymentFrequency::Monthly).unwrap();
        assert_eq!(schedule[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(schedule[1].date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_invalid_term_for_frequency() {
        let err = generate_schedule(dec!(1000), dec!(5), 10, start(), PaymentFrequency::Quarterly)
            .unwrap_err();
        assert!(matches!(
            err,
            LeaseFinanceError::InvalidTerm {
                term_months: 10,
                months_per_period: 3
            }
        ));
    }

    #[test]
    fn test_zero_term_rejected() {
        assert!(matches!(
            calculate_monthly_payment(dec!(1000), dec!(5), 0),
            Err(LeaseFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_summary_totals() {
        let schedule =
            generate_schedule(dec!(100000), dec!(10), 36, start(), PaymentFrequency::Monthly)
                .unwrap();
        let summary = summarize_schedule(&schedule);
        assert_eq!(summary.number_of_payments, 36);
        assert!((summary.total_principal - dec!(100000)).abs() < dec!(0.000001));
        assert_eq!(summary.total_paid, summary.total_principal + summary.total_interest);
        assert_eq!(
            summary.final_payment_date,
            Some(NaiveDate::from_ymd_opt(2027, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_loan_parameters_term_cap() {
        let params = LoanParameters {
            principal: dec!(1000),
            annual_interest_rate_pct: dec!(5),
            term_months: 1212,
            start_date: start(),
            payment_frequency: PaymentFrequency::Annual,
        };
        assert!(generate_loan_schedule(&params).is_err());
    }
}
