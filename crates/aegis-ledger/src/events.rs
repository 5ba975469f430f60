//! Ledger events appended to the durable journal.

use crate::ids::EntryId;
use aegis_signing::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in the ledger emits exactly one event.
///
/// Idempotent no-ops (duplicate records, re-verification) emit nothing,
/// so the journal is a faithful change log rather than a call log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    Recorded {
        entry_id: EntryId,
        submitter: String,
        outcome_code: String,
        at: DateTime<Utc>,
    },
    Verified {
        entry_id: EntryId,
        by: String,
        at: DateTime<Utc>,
    },
    ProofSubmitted {
        proof_id: EntryId,
        decision_hash: ContentHash,
        submitter: String,
        at: DateTime<Utc>,
    },
    ProofValidated {
        proof_id: EntryId,
        by: String,
        valid: bool,
        at: DateTime<Utc>,
    },
    SignerAuthorized {
        signer: String,
        by: String,
        at: DateTime<Utc>,
    },
    SignerRevoked {
        signer: String,
        by: String,
        at: DateTime<Utc>,
    },
}
