pub mod cma;
pub mod compliance;
pub mod error;
pub mod profile;
pub mod types;
pub mod underwriting;

pub use error::CreditEngineError;
pub use types::*;

/// Standard result type for all engine operations
pub type CreditEngineResult<T> = Result<T, CreditEngineError>;
