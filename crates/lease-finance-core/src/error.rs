use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaseFinanceError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid term: {term_months} months is not a multiple of {months_per_period} months per payment period")]
    InvalidTerm {
        term_months: u32,
        months_per_period: u32,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LeaseFinanceError {
    fn from(e: serde_json::Error) -> Self {
        LeaseFinanceError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for LeaseFinanceError {
    fn from(e: serde_yaml::Error) -> Self {
        LeaseFinanceError::SerializationError(e.to_string())
    }
}
