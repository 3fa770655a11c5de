use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LeaseFinanceError;
use crate::types::{Money, Rate};
use crate::LeaseFinanceResult;

/// Lower edge of the IRR search bracket (per period).
pub const IRR_LOWER_BOUND: Rate = dec!(-0.99);
/// Upper edge of the IRR search bracket (per period).
pub const IRR_UPPER_BOUND: Rate = dec!(10.0);
/// Bisection stops once the bracket is narrower than this.
pub const IRR_TOLERANCE: Rate = dec!(0.0000000001);
pub const MAX_IRR_ITERATIONS: u32 = 200;

/// Why the IRR solver could not produce a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonConvergence {
    /// No cash flows after the initial investment.
    NoCashFlows,
    /// NPV has the same sign at both ends of the bracket.
    NoSignChange,
    /// Bracket still wider than the tolerance after the iteration cap.
    IterationLimit,
}

/// Outcome of the IRR solver. Callers must branch on it; there is no NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrResult {
    Converged { rate: Rate, iterations: u32 },
    NotConverged { reason: NonConvergence },
}

impl IrrResult {
    pub fn rate(&self) -> Option<Rate> {
        match self {
            IrrResult::Converged { rate, .. } => Some(*rate),
            IrrResult::NotConverged { .. } => None,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IrrResult::Converged { .. })
    }

    /// Scale a converged periodic rate to a nominal annual rate.
    pub fn annualized(&self, periods_per_year: u32) -> Option<Rate> {
        self.rate().map(|r| r * Decimal::from(periods_per_year))
    }
}

/// Level payment that amortises `principal` over `periods` at `periodic_rate`.
///
/// `payment = P * r / (1 - (1 + r)^-n)`, or `P / n` when the rate is zero.
/// As `(1 + r)^n` grows past the decimal range the payment tends to the
/// interest-only amount `P * r`, which is returned instead.
pub fn annuity_payment(
    principal: Money,
    periodic_rate: Rate,
    periods: u32,
) -> LeaseFinanceResult<Money> {
    if periods == 0 {
        return Err(LeaseFinanceError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if periodic_rate <= dec!(-1) {
        return Err(LeaseFinanceError::InvalidInput {
            field: "periodic_rate".into(),
            reason: "Periodic rate must be greater than -100%".into(),
        });
    }

    let n = Decimal::from(periods);
    if periodic_rate.is_zero() {
        return Ok(principal / n);
    }

    let interest_only = principal
        .checked_mul(periodic_rate)
        .ok_or_else(|| LeaseFinanceError::InvalidInput {
            field: "principal".into(),
            reason: "Periodic interest exceeds the decimal range".into(),
        })?;

    let one_plus_r = Decimal::ONE + periodic_rate;
    let factor = match one_plus_r.checked_powu(periods as u64) {
        Some(factor) => factor,
        None => return Ok(interest_only),
    };
    // (1 + r)^-n; a factor that underflowed to zero means the payment tends to zero
    let discount = match Decimal::ONE.checked_div(factor) {
        Some(discount) => discount,
        None => return Ok(Decimal::ZERO),
    };

    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        // Rate too small to register at 28 digits
        return Ok(principal / n);
    }
    interest_only
        .checked_div(denominator)
        .ok_or_else(|| LeaseFinanceError::InvalidInput {
            field: "periodic_rate".into(),
            reason: format!("Level payment over {periods} periods exceeds the decimal range"),
        })
}

/// Net Present Value with the initial investment at t = 0 and the first
/// cash flow one period later: `-I + sum(cf[t] / (1 + r)^(t + 1))`.
pub fn npv(
    initial_investment: Money,
    cash_flows: &[Money],
    rate: Rate,
) -> LeaseFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(LeaseFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let discount = Decimal::ONE / (Decimal::ONE + rate);
    let mut factor = Decimal::ONE;
    let mut result = -initial_investment;

    for (t, cf) in cash_flows.iter().enumerate() {
        factor = factor
            .checked_mul(discount)
            .ok_or_else(|| LeaseFinanceError::InvalidInput {
                field: "rate".into(),
                reason: format!("Discount factor overflowed at period {}", t + 1),
            })?;
        result = cf
            .checked_mul(factor)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| LeaseFinanceError::InvalidInput {
                field: "cash_flows".into(),
                reason: format!("Present value overflowed at period {}", t + 1),
            })?;
    }

    Ok(result)
}

/// A value with the same sign as NPV at `rate`, computed without overflow
/// anywhere in the IRR bracket. For non-negative rates this is the NPV
/// itself; for negative rates it is the NPV compounded to the horizon
/// (Horner form), which only ever multiplies by factors below one.
/// Arithmetic saturates, so flows near the decimal limit keep their sign.
fn npv_sign_proxy(initial_investment: Money, cash_flows: &[Money], rate: Rate) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    if rate >= Decimal::ZERO {
        let discount = Decimal::ONE / one_plus_r;
        let mut factor = Decimal::ONE;
        let mut acc = -initial_investment;
        for cf in cash_flows {
            factor *= discount;
            acc = acc.saturating_add(cf.saturating_mul(factor));
        }
        acc
    } else {
        cash_flows
            .iter()
            .fold(-initial_investment, |acc, cf| {
                acc.saturating_mul(one_plus_r).saturating_add(*cf)
            })
    }
}

/// Internal Rate of Return by bisection over
/// [`IRR_LOWER_BOUND`, `IRR_UPPER_BOUND`] per period.
///
/// Returns [`IrrResult::NotConverged`] when the bracket holds no sign change
/// or the iteration cap is reached before the bracket narrows to
/// [`IRR_TOLERANCE`].
pub fn irr(initial_investment: Money, cash_flows: &[Money]) -> IrrResult {
    if cash_flows.is_empty() {
        return IrrResult::NotConverged {
            reason: NonConvergence::NoCashFlows,
        };
    }

    let mut lo = IRR_LOWER_BOUND;
    let mut hi = IRR_UPPER_BOUND;
    let mut f_lo = npv_sign_proxy(initial_investment, cash_flows, lo);
    let f_hi = npv_sign_proxy(initial_investment, cash_flows, hi);

    if f_lo.is_zero() {
        return IrrResult::Converged { rate: lo, iterations: 0 };
    }
    if f_hi.is_zero() {
        return IrrResult::Converged { rate: hi, iterations: 0 };
    }
    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        tracing::debug!(%f_lo, %f_hi, "IRR bracket holds no sign change");
        return IrrResult::NotConverged {
            reason: NonConvergence::NoSignChange,
        };
    }

    for i in 1..=MAX_IRR_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let f_mid = npv_sign_proxy(initial_investment, cash_flows, mid);

        if f_mid.is_zero() || (hi - lo) / dec!(2) < IRR_TOLERANCE {
            tracing::trace!(iterations = i, rate = %mid, "IRR converged");
            return IrrResult::Converged {
                rate: mid,
                iterations: i,
            };
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    IrrResult::NotConverged {
        reason: NonConvergence::IterationLimit,
    }
}
