//! Pro-rata allocation of loan interest to the investors funding it.

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::PaymentScheduleEntry;
use crate::error::LeaseFinanceError;
use crate::types::{Money, Rate};
use crate::LeaseFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub id: String,
    pub name: String,
    pub investment_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorReturn {
    pub investor_id: String,
    pub name: String,
    pub investment_amount: Money,
    /// Fraction of the pooled capital (0.4 = 40%)
    pub share: Rate,
    /// Interest earned each period, aligned with the schedule rows
    pub monthly_returns: Vec<Money>,
    pub total_interest: Money,
    pub total_return: Money,
    pub roi: Rate,
}

/// Pool-level view of an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTotals {
    pub investor_count: usize,
    pub total_invested: Money,
    pub total_interest: Money,
    pub total_return: Money,
    /// Interest paid to the pool in each period
    pub period_interest: Vec<Money>,
    pub pool_roi: Rate,
}

/// Boundary rules for an investor roster. Counts are configuration; the
/// allocation itself never enforces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestorPolicy {
    pub min_investors: usize,
    pub max_investors: usize,
    /// Largest accepted gap between the sum of investments and the principal
    pub sum_tolerance: Money,
}

impl Default for InvestorPolicy {
    fn default() -> Self {
        Self {
            min_investors: 1,
            max_investors: 20,
            sum_tolerance: dec!(0.01),
        }
    }
}

impl InvestorPolicy {
    pub fn validate(&self, investors: &[Investor], principal: Money) -> LeaseFinanceResult<()> {
        if investors.len() < self.min_investors {
            return Err(LeaseFinanceError::InvalidInput {
                field: "investors".into(),
                reason: format!(
                    "At least {} investor(s) required, got {}",
                    self.min_investors,
                    investors.len()
                ),
            });
        }
        if investors.len() > self.max_investors {
            return Err(LeaseFinanceError::InvalidInput {
                field: "investors".into(),
                reason: format!(
                    "At most {} investors allowed, got {}",
                    self.max_investors,
                    investors.len()
                ),
            });
        }

        let mut seen = HashSet::new();
        for inv in investors {
            if !seen.insert(inv.id.as_str()) {
                return Err(LeaseFinanceError::InvalidInput {
                    field: "investors.id".into(),
                    reason: format!("Duplicate investor id '{}'", inv.id),
                });
            }
            if inv.name.trim().is_empty() {
                return Err(LeaseFinanceError::InvalidInput {
                    field: "investors.name".into(),
                    reason: format!("Investor '{}' has an empty name", inv.id),
                });
            }
            if inv.investment_amount < Decimal::ZERO {
                return Err(LeaseFinanceError::InvalidInput {
                    field: "investors.investment_amount".into(),
                    reason: format!("Investor '{}' has a negative investment", inv.id),
                });
            }
        }

        let total: Money = investors.iter().map(|i| i.investment_amount).sum();
        if (total - principal).abs() > self.sum_tolerance {
            return Err(LeaseFinanceError::InvalidInput {
                field: "investors.investment_amount".into(),
                reason: format!("Investments sum to {total} but the loan principal is {principal}"),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split every period's interest across investors by their share of the
/// pooled capital.
///
/// Shares are taken against the sum of investments, not the nominal loan
/// amount, so interest is always fully partitioned. A roster that does not
/// match the principal is still allocated; use [`InvestorPolicy::validate`]
/// to reject it upstream.
pub fn allocate_returns(
    schedule: &[PaymentScheduleEntry],
    investors: &[Investor],
) -> LeaseFinanceResult<Vec<InvestorReturn>> {
    let pool: Money = investors.iter().map(|i| i.investment_amount).sum();
    if pool.is_zero() {
        return Err(LeaseFinanceError::DivisionByZero {
            context: "investor shares (total investment is zero)".into(),
        });
    }

    let returns = investors
        .iter()
        .map(|inv| {
            let share = inv.investment_amount / pool;
            let monthly_returns: Vec<Money> =
                schedule.iter().map(|entry| entry.interest * share).collect();
            let total_interest: Money = monthly_returns.iter().sum();
            let roi = if inv.investment_amount.is_zero() {
                Decimal::ZERO
            } else {
                total_interest / inv.investment_amount
            };
            InvestorReturn {
                investor_id: inv.id.clone(),
                name: inv.name.clone(),
                investment_amount: inv.investment_amount,
                share,
                monthly_returns,
                total_interest,
                total_return: inv.investment_amount + total_interest,
                roi,
            }
        })
        .collect();

    Ok(returns)
}

pub fn allocation_totals(returns: &[InvestorReturn]) -> AllocationTotals {
    let periods = returns
        .iter()
        .map(|r| r.monthly_returns.len())
        .max()
        .unwrap_or(0);
    let mut period_interest = vec![Decimal::ZERO; periods];
    for r in returns {
        for (slot, amount) in period_interest.iter_mut().zip(&r.monthly_returns) {
            *slot += amount;
        }
    }

    let total_invested: Money = returns.iter().map(|r| r.investment_amount).sum();
    let total_interest: Money = returns.iter().map(|r| r.total_interest).sum();
    let pool_roi = if total_invested.is_zero() {
        Decimal::ZERO
    } else {
        total_interest / total_invested
    };

    AllocationTotals {
        investor_count: returns.len(),
        total_invested,
        total_interest,
        total_return: total_invested + total_interest,
        period_interest,
        pool_roi,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::generate_schedule;
    use crate::types::PaymentFrequency;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn investor(id: &str, amount: Decimal) -> Investor {
        Investor {
            id: id.into(),
            name: format!("Investor {id}"),
            investment_amount: amount,
        }
    }

    fn schedule() -> Vec<PaymentScheduleEntry> {
        generate_schedule(
            dec!(100000),
            dec!(10),
            36,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            PaymentFrequency::Monthly,
        )
        .unwrap()
    }

    #[test]
    fn test_forty_sixty_split() {
        let investors = vec![investor("a", dec!(40000)), investor("b", dec!(60000))];
        let returns = allocate_returns(&schedule(), &investors).unwrap();

        assert_eq!(returns[0].share, dec!(0.4));
        assert_eq!(returns[1].share, dec!(0.6));
        assert!((returns[0].monthly_returns[0] - dec!(333.33)).abs() < dec!(0.01));
        assert!((returns[1].monthly_returns[0] - dec!(500.00)).abs() < dec!(0.01));
    }

    #[test]
    fn test_roi_and_totals() {
        let investors = vec![investor("a", dec!(25000)), investor("b", dec!(75000))];
        let returns = allocate_returns(&schedule(), &investors).unwrap();
        for r in &returns {
            assert_eq!(r.total_return, r.investment_amount + r.total_interest);
            assert_eq!(r.roi, r.total_interest / r.investment_amount);
        }
        // Same ROI for everyone in a pro-rata pool
        assert!((returns[0].roi - returns[1].roi).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_mismatched_roster_still_allocates() {
        // 90k against a 100k schedule: shares still sum to one
        let investors = vec![investor("a", dec!(30000)), investor("b", dec!(60000))];
        let returns = allocate_returns(&schedule(), &investors).unwrap();
        let share_sum: Decimal = returns.iter().map(|r| r.share).sum();
        assert!((share_sum - Decimal::ONE).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_zero_pool_is_error() {
        let investors = vec![investor("a", Decimal::ZERO)];
        assert!(allocate_returns(&schedule(), &investors).is_err());
    }

    #[test]
    fn test_zero_investment_has_zero_roi() {
        let investors = vec![investor("a", dec!(100000)), investor("b", Decimal::ZERO)];
        let returns = allocate_returns(&schedule(), &investors).unwrap();
        assert_eq!(returns[1].roi, Decimal::ZERO);
        assert_eq!(returns[1].total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_policy_rejects_sum_mismatch() {
        let policy = InvestorPolicy::default();
        let investors = vec![investor("a", dec!(50000)), investor("b", dec!(49000))];
        assert!(policy.validate(&investors, dec!(100000)).is_err());
        assert!(policy.validate(&investors, dec!(99000.005)).is_ok());
    }

    #[test]
    fn test_policy_investor_count_is_configurable() {
        let investors = vec![investor("a", dec!(100000))];
        assert!(InvestorPolicy::default().validate(&investors, dec!(100000)).is_ok());

        let strict = InvestorPolicy {
            min_investors: 3,
            ..InvestorPolicy::default()
        };
        assert!(strict.validate(&investors, dec!(100000)).is_err());
    }

    #[test]
    fn test_policy_rejects_duplicates_and_blank_names() {
        let policy = InvestorPolicy::default();
        let dupes = vec![investor("a", dec!(50000)), investor("a", dec!(50000))];
        assert!(policy.validate(&dupes, dec!(100000)).is_err());

        let mut blank = investor("c", dec!(100000));
        blank.name = "  ".into();
        assert!(policy.validate(&[blank], dec!(100000)).is_err());
    }

    #[test]
    fn test_allocation_totals_match_schedule_interest() {
        let sched = schedule();
        let investors = vec![
            investor("a", dec!(20000)),
            investor("b", dec!(30000)),
            investor("c", dec!(50000)),
        ];
        let totals = allocation_totals(&allocate_returns(&sched, &investors).unwrap());
        assert_eq!(totals.investor_count, 3);
        assert_eq!(totals.total_invested, dec!(100000));
        for (pooled, entry) in totals.period_interest.iter().zip(&sched) {
            assert!((*pooled - entry.interest).abs() < dec!(0.000001));
        }
    }
}
