use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LeaseFinanceError;
use crate::LeaseFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Percentages as entered by users (5 = 5%). Fields carrying one end in `_pct`.
pub type Percent = Decimal;

/// Multiples (e.g., 1.35x DSCR)
pub type Multiple = Decimal;

/// Convert a user-facing percentage into a decimal rate.
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / dec!(100)
}

/// Parse a float from an untyped boundary (JSON from a browser, FFI) into a
/// Decimal. NaN and infinities are rejected instead of coerced to zero.
pub fn decimal_from_f64(value: f64, field: &str) -> LeaseFinanceResult<Decimal> {
    if !value.is_finite() {
        return Err(LeaseFinanceError::InvalidInput {
            field: field.into(),
            reason: format!("Expected a finite number, got {value}"),
        });
    }
    Decimal::from_f64(value).ok_or_else(|| LeaseFinanceError::InvalidInput {
        field: field.into(),
        reason: format!("{value} is outside the representable decimal range"),
    })
}

/// How often a loan is repaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl PaymentFrequency {
    pub fn months_per_period(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 1,
            PaymentFrequency::Quarterly => 3,
            PaymentFrequency::SemiAnnual => 6,
            PaymentFrequency::Annual => 12,
        }
    }

    pub fn periods_per_year(self) -> u32 {
        12 / self.months_per_period()
    }
}

impl std::str::FromStr for PaymentFrequency {
    type Err = LeaseFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "quarterly" => Ok(PaymentFrequency::Quarterly),
            "semiannual" => Ok(PaymentFrequency::SemiAnnual),
            "annual" | "yearly" => Ok(PaymentFrequency::Annual),
            other => Err(LeaseFinanceError::InvalidInput {
                field: "payment_frequency".into(),
                reason: format!(
                    "Unknown frequency '{other}' (expected monthly, quarterly, semi-annual or annual)"
                ),
            }),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for warning in &warnings {
        tracing::warn!(methodology, "{warning}");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
