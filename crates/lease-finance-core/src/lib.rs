pub mod allocation;
pub mod amortization;
pub mod error;
pub mod metrics;
pub mod time_value;
pub mod types;

#[cfg(feature = "leasing")]
pub mod leasing;

#[cfg(feature = "projections")]
pub mod projections;

#[cfg(feature = "scenarios")]
pub mod scenario;

pub use error::LeaseFinanceError;
pub use types::*;

/// Standard result type for all lease-finance operations
pub type LeaseFinanceResult<T> = Result<T, LeaseFinanceError>;
