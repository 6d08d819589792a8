use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditEngineError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("Justification too short: {length} characters (minimum {minimum})")]
    JustificationTooShort { length: usize, minimum: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CreditEngineError {
    fn from(e: serde_json::Error) -> Self {
        CreditEngineError::SerializationError(e.to_string())
    }
}
