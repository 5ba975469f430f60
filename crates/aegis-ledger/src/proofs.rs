//! Signer attestations over decision hashes.
//!
//! A proof is a lower-level path than an execution record: anyone with
//! signer status can attest that a key signed a decision hash, and a
//! validator later checks the attestation against the signer they
//! expected. Proofs do not require a matching execution record.

use aegis_signing::{ContentHash, Signature, VerificationKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::EntryId;

/// Validation status of a proof. Moves forward exactly once:
/// pending to valid or pending to invalid, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    Pending,
    Valid,
    Invalid,
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Valid => write!(f, "VALID"),
            Self::Invalid => write!(f, "INVALID"),
        }
    }
}

/// An attestation that `signer` signed `decision_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionProof {
    pub proof_id: EntryId,
    /// Content hash of the decision this proof attests to.
    pub decision_hash: ContentHash,
    /// Signature over the decision hash bytes.
    pub signature: Signature,
    /// Public key of the claimed signer.
    pub signer: VerificationKey,
    pub submitter: String,
    pub submitted_at: DateTime<Utc>,
    pub status: ProofStatus,
    pub validated_by: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
}
