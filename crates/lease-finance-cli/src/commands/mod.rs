pub mod leasing;
pub mod loan;
pub mod metrics;
pub mod projections;
pub mod scenario;
