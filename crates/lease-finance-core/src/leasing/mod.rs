pub mod cash_flow;
pub mod financials;

pub use cash_flow::LeasingCashFlowEntry;
pub use financials::{
    calculate_leasing_financials, ClientQuotation, LeasingInputs, LeasingResult, LessorCost,
    Profitability,
};
