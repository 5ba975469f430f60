//! Safety gate error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafetyError {
    /// Caller lacks the privilege for an administrative operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation is invalid in the current safety state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Persistence(#[from] aegis_persistence::PersistenceError),
}

pub type SafetyResult<T> = Result<T, SafetyError>;
