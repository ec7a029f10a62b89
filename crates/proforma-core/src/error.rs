use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProformaError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid range for {context}: end date {end} is before start date {start}")]
    InvalidRange {
        context: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Unknown expense type: '{0}' (expected NNN, BASE YEAR, FULL SERVICE or PLUS UTILITIES)")]
    UnknownExpenseType(String),

    #[error("Invalid loan terms: {field}: {reason}")]
    InvalidLoanTerms { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ProformaError {
    fn from(e: serde_json::Error) -> Self {
        ProformaError::SerializationError(e.to_string())
    }
}
