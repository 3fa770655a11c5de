use lease_finance_core::metrics::{
    break_even_point, calculate_irr, calculate_npv, discounted_payback_period, payback_period,
    PaybackPeriod,
};
use lease_finance_core::time_value::{IrrResult, NonConvergence};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// NPV / IRR consistency
// ===========================================================================

#[test]
fn test_npv_at_irr_is_zero() {
    let cases: Vec<(Decimal, Vec<Decimal>)> = vec![
        (dec!(1000), vec![dec!(400), dec!(400), dec!(400)]),
        (dec!(100), vec![dec!(0), dec!(0), dec!(300)]),
        (dec!(5000), vec![dec!(1000); 8]),
        (dec!(1000), vec![dec!(200), dec!(300), dec!(250)]),
        (dec!(100000), vec![dec!(3226.72); 36]),
    ];

    for (initial, flows) in cases {
        match calculate_irr(initial, &flows) {
            IrrResult::Converged { rate, .. } => {
                let npv = calculate_npv(initial, &flows, rate).unwrap();
                assert!(npv.abs() < dec!(0.01), "NPV at IRR {rate} was {npv}");
            }
            other => panic!("expected convergence, got {other:?}"),
        }
    }
}

#[test]
fn test_irr_without_sign_change_is_explicit() {
    // All inflows, nothing invested
    assert_eq!(
        calculate_irr(dec!(-500), &[dec!(100), dec!(100)]),
        IrrResult::NotConverged {
            reason: NonConvergence::NoSignChange
        }
    );
    // Nothing ever comes back
    assert_eq!(
        calculate_irr(dec!(500), &[Decimal::ZERO, Decimal::ZERO]),
        IrrResult::NotConverged {
            reason: NonConvergence::NoSignChange
        }
    );
}

#[test]
fn test_irr_serializes_as_tagged_status() {
    let json = serde_json::to_value(calculate_irr(dec!(-1), &[dec!(1)])).unwrap();
    assert_eq!(json["status"], "not_converged");
    assert_eq!(json["reason"], "no_sign_change");
}

#[test]
fn test_npv_first_flow_discounted_one_period() {
    let npv = calculate_npv(Decimal::ZERO, &[dec!(110)], dec!(0.10)).unwrap();
    assert!((npv - dec!(100)).abs() < dec!(0.0000001));
}

// ===========================================================================
// Payback states
// ===========================================================================

#[test]
fn test_payback_never_versus_not_applicable() {
    let never = payback_period(dec!(1000), dec!(-50));
    let na = payback_period(Decimal::ZERO, dec!(-50));
    assert_eq!(never, PaybackPeriod::Never);
    assert_eq!(na, PaybackPeriod::NotApplicable);
    assert_eq!(never.display("months"), "Never");
    assert_eq!(na.display("months"), "N/A");
    assert!(!never.display("months").contains('∞'));
}

#[test]
fn test_payback_serializes_distinct_states() {
    let never = serde_json::to_value(PaybackPeriod::Never).unwrap();
    let na = serde_json::to_value(PaybackPeriod::NotApplicable).unwrap();
    assert_eq!(never["status"], "never");
    assert_eq!(na["status"], "not_applicable");
}

#[test]
fn test_discounted_payback_matches_simple_at_zero_rate() {
    let flows = vec![dec!(250); 6];
    assert_eq!(
        discounted_payback_period(dec!(1000), &flows, Decimal::ZERO).unwrap(),
        PaybackPeriod::Periods { periods: dec!(4) }
    );
    assert_eq!(payback_period(dec!(1000), dec!(250)), PaybackPeriod::Periods { periods: dec!(4) });
}

#[test]
fn test_break_even_not_applicable_without_fixed_costs() {
    assert_eq!(
        break_even_point(Decimal::ZERO, dec!(100), dec!(50)),
        PaybackPeriod::NotApplicable
    );
}
