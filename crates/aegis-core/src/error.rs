//! Error types for aegis-core.

use thiserror::Error;

/// Core error types.
///
/// Validation errors are raised before authorization; a malformed decision
/// never reaches the safety gate or the signing authority.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid confidence: {0}")]
    InvalidConfidence(String),

    #[error("Invalid agent id: {0}")]
    InvalidAgentId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
