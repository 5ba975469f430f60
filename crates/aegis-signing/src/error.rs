//! Error types for aegis-signing.

use thiserror::Error;

/// Signing error types.
///
/// A signing failure is fatal to the affected decision only; the process
/// keeps running.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Result type alias for signing operations.
pub type SigningResult<T> = std::result::Result<T, SigningError>;
