//! Verifiable audit ledger for executed decisions.
//!
//! Every resolved execution is recorded under a deterministic entry id,
//! can be verified exactly once (the flag never reverts), and may carry
//! externally validated proofs. Writes are restricted to signers managed
//! by the ledger owner.

pub mod error;
pub mod events;
pub mod ids;
pub mod ledger;
pub mod proofs;
pub mod signers;

pub use error::{LedgerError, LedgerResult};
pub use events::LedgerEvent;
pub use ids::{decision_entry_id, proof_entry_id, EntryId};
pub use ledger::{AuditLedger, ExecutionRecord};
pub use proofs::{ExecutionProof, ProofStatus};
pub use signers::{SignerEntry, SignerRegistry};
