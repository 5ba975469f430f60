//! Executor error types.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Decision failed field validation.
    #[error("Invalid decision: {0}")]
    InvalidDecision(#[from] aegis_core::CoreError),

    /// Signed order failed signature verification. This is a security
    /// event, not a routine failure.
    #[error("Signature verification failed for decision {0}")]
    Verification(Uuid),

    #[error(transparent)]
    Signing(#[from] aegis_signing::SigningError),

    /// Could not obtain a portfolio snapshot for authorization.
    #[error("Portfolio unavailable: {0}")]
    Portfolio(String),
}

pub type ExecutorResult<T> = Result<T, SubmitError>;
