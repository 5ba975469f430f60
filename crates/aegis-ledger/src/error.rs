//! Ledger error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown ledger entry: {0}")]
    UnknownEntry(String),

    #[error("Unknown proof: {0}")]
    UnknownProof(String),

    /// Submitter is not an authorized signer.
    #[error("Unauthorized signer: {0}")]
    UnauthorizedSigner(String),

    /// Caller lacks the role for a privileged operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed order failed signature verification on record.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Proof status can only move forward from pending.
    #[error("Proof already validated: {0}")]
    AlreadyValidated(String),

    #[error(transparent)]
    Persistence(#[from] aegis_persistence::PersistenceError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
