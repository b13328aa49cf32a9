use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbfomError {
    #[error("Invalid parameters: {field} — {reason}")]
    InvalidParameters { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (residual: {last_delta})")]
    NoConvergence {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("No sign change: {0}")]
    NoSignChange(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Balance sheet does not balance in month {month} (assets − liabilities & equity = {difference})")]
    BalanceCheckFailed { month: u32, difference: Decimal },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DbfomError {
    fn from(e: serde_json::Error) -> Self {
        DbfomError::SerializationError(e.to_string())
    }
}

impl DbfomError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DbfomError::InvalidParameters {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
