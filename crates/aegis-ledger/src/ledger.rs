//! The audit ledger: append-style record store with one-way verification.

use aegis_core::{Actor, ExecutionOutcome};
use aegis_signing::{
    verify_signed_order, ContentHash, Signature, SignedOrder, VerificationKey,
};
use aegis_persistence::EventJournal;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::ids::{decision_entry_id, proof_entry_id, EntryId};
use crate::proofs::{ExecutionProof, ProofStatus};
use crate::signers::SignerRegistry;

// ============================================================================
// ExecutionRecord
// ============================================================================

/// A recorded execution: the signed order, its resolved outcome, and the
/// verification flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub entry_id: EntryId,
    pub content_hash: ContentHash,
    pub order: SignedOrder,
    pub outcome: ExecutionOutcome,
    /// Short outcome code, duplicated for log and query convenience.
    pub outcome_code: String,
    pub submitter: String,
    pub recorded_at: DateTime<Utc>,
    /// One-way flag: false until verified, then true forever.
    pub verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

// ============================================================================
// AuditLedger
// ============================================================================

/// Thread-safe audit ledger; share via `Arc<AuditLedger>`.
pub struct AuditLedger {
    records: DashMap<EntryId, ExecutionRecord>,
    proofs: DashMap<EntryId, ExecutionProof>,
    signers: SignerRegistry,
    journal: Option<EventJournal>,
}

impl AuditLedger {
    /// Create a ledger owned by `owner`.
    pub fn new(owner: &Actor) -> LedgerResult<Self> {
        Ok(Self {
            records: DashMap::new(),
            proofs: DashMap::new(),
            signers: SignerRegistry::new(owner)?,
            journal: None,
        })
    }

    /// Attach a durable journal for ledger events.
    #[must_use]
    pub fn with_journal(mut self, journal: EventJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Record a resolved execution.
    ///
    /// The entry id is derived deterministically from the content hash,
    /// submitter, and `recorded_at`, so retrying the same record call is
    /// idempotent: the existing entry is kept and its id returned without
    /// emitting a second event. The signed order is re-verified before
    /// anything is stored.
    pub fn record(
        &self,
        order: &SignedOrder,
        outcome: &ExecutionOutcome,
        submitter: &str,
        recorded_at: DateTime<Utc>,
    ) -> LedgerResult<EntryId> {
        if !self.signers.is_authorized(submitter) {
            warn!(submitter, "Record rejected: submitter is not an authorized signer");
            return Err(LedgerError::UnauthorizedSigner(submitter.to_string()));
        }
        if !verify_signed_order(order) {
            error!(
                decision_id = %order.decision.id,
                submitter,
                "Record rejected: signed order failed verification"
            );
            return Err(LedgerError::InvalidSignature(format!(
                "decision {}",
                order.decision.id
            )));
        }

        let entry_id = decision_entry_id(&order.content_hash, submitter, recorded_at);
        if self.records.contains_key(&entry_id) {
            debug!(entry_id = %entry_id, "Duplicate record, returning existing entry");
            return Ok(entry_id);
        }

        let record = ExecutionRecord {
            entry_id,
            content_hash: order.content_hash,
            order: order.clone(),
            outcome: outcome.clone(),
            outcome_code: outcome.code(),
            submitter: submitter.to_string(),
            recorded_at,
            verified: false,
            verified_by: None,
            verified_at: None,
        };
        self.records.insert(entry_id, record);

        info!(
            entry_id = %entry_id,
            decision_id = %order.decision.id,
            outcome = %outcome.code(),
            submitter,
            "Execution recorded"
        );
        self.emit(&LedgerEvent::Recorded {
            entry_id,
            submitter: submitter.to_string(),
            outcome_code: outcome.code(),
            at: recorded_at,
        });
        Ok(entry_id)
    }

    /// Verify a recorded execution.
    ///
    /// Re-checks the stored signed order, then flips the one-way verified
    /// flag. Verifying an already-verified entry is a no-op and emits no
    /// event. The flag never goes back to false.
    pub fn verify(&self, entry_id: &EntryId, actor: &Actor) -> LedgerResult<()> {
        let mut record = self
            .records
            .get_mut(entry_id)
            .ok_or_else(|| LedgerError::UnknownEntry(entry_id.to_hex()))?;

        if record.verified {
            debug!(entry_id = %entry_id, "Entry already verified, no-op");
            return Ok(());
        }
        if !verify_signed_order(&record.order) {
            error!(
                entry_id = %entry_id,
                "SECURITY: stored order fails verification"
            );
            return Err(LedgerError::InvalidSignature(entry_id.to_hex()));
        }

        let now = Utc::now();
        record.verified = true;
        record.verified_by = Some(actor.id.clone());
        record.verified_at = Some(now);
        drop(record);

        info!(entry_id = %entry_id, by = %actor, "Entry verified");
        self.emit(&LedgerEvent::Verified {
            entry_id: *entry_id,
            by: actor.id.clone(),
            at: now,
        });
        Ok(())
    }

    /// Fetch a record by id.
    #[must_use]
    pub fn get(&self, entry_id: &EntryId) -> Option<ExecutionRecord> {
        self.records.get(entry_id).map(|r| r.clone())
    }

    /// All records written by a submitter, oldest first.
    #[must_use]
    pub fn records_by_submitter(&self, submitter: &str) -> Vec<ExecutionRecord> {
        let mut records: Vec<ExecutionRecord> = self
            .records
            .iter()
            .filter(|r| r.submitter == submitter)
            .map(|r| r.clone())
            .collect();
        records.sort_by_key(|r| r.recorded_at);
        records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ------------------------------------------------------------------
    // Proofs
    // ------------------------------------------------------------------

    /// Submit an attestation that `signer` signed `decision_hash`.
    ///
    /// The proof id is derived deterministically from the decision hash,
    /// submitter, and timestamp; resubmitting the same attestation is
    /// idempotent. Proofs stand alone and do not require a matching
    /// execution record.
    pub fn submit_proof(
        &self,
        decision_hash: &ContentHash,
        signature: Signature,
        signer: VerificationKey,
        submitter: &str,
        submitted_at: DateTime<Utc>,
    ) -> LedgerResult<EntryId> {
        if !self.signers.is_authorized(submitter) {
            warn!(submitter, "Proof rejected: submitter is not an authorized signer");
            return Err(LedgerError::UnauthorizedSigner(submitter.to_string()));
        }

        let proof_id = proof_entry_id(decision_hash.as_bytes(), submitter, submitted_at);
        if self.proofs.contains_key(&proof_id) {
            debug!(proof_id = %proof_id, "Duplicate proof, returning existing id");
            return Ok(proof_id);
        }

        self.proofs.insert(
            proof_id,
            ExecutionProof {
                proof_id,
                decision_hash: *decision_hash,
                signature,
                signer,
                submitter: submitter.to_string(),
                submitted_at,
                status: ProofStatus::Pending,
                validated_by: None,
                validated_at: None,
            },
        );

        info!(
            proof_id = %proof_id,
            decision_hash = %decision_hash.to_hex(),
            submitter,
            "Proof submitted"
        );
        self.emit(&LedgerEvent::ProofSubmitted {
            proof_id,
            decision_hash: *decision_hash,
            submitter: submitter.to_string(),
            at: submitted_at,
        });
        Ok(proof_id)
    }

    /// Validate a pending proof against the signer the caller expected.
    ///
    /// Requires a validating role. The proof is valid when the stored
    /// signer matches `expected_signer` and the stored signature checks
    /// out over the decision hash. The status moves forward exactly
    /// once; any later validation attempt is an error.
    pub fn validate_proof(
        &self,
        proof_id: &EntryId,
        expected_signer: &VerificationKey,
        actor: &Actor,
    ) -> LedgerResult<bool> {
        if !actor.can_validate_proofs() {
            warn!(by = %actor, "Rejected proof validation by unprivileged actor");
            return Err(LedgerError::Unauthorized(format!(
                "{actor} may not validate proofs"
            )));
        }

        let mut proof = self
            .proofs
            .get_mut(proof_id)
            .ok_or_else(|| LedgerError::UnknownProof(proof_id.to_hex()))?;

        if proof.status != ProofStatus::Pending {
            return Err(LedgerError::AlreadyValidated(format!(
                "proof {} is {}",
                proof_id, proof.status
            )));
        }

        let signer_matches = proof.signer == *expected_signer;
        let signature_checks = proof
            .signer
            .verify(proof.decision_hash.as_bytes(), &proof.signature);
        let valid = signer_matches && signature_checks;
        if !valid {
            warn!(
                proof_id = %proof_id,
                signer_matches,
                signature_checks,
                "Proof failed validation"
            );
        }

        let now = Utc::now();
        proof.status = if valid {
            ProofStatus::Valid
        } else {
            ProofStatus::Invalid
        };
        proof.validated_by = Some(actor.id.clone());
        proof.validated_at = Some(now);
        drop(proof);

        info!(proof_id = %proof_id, by = %actor, valid, "Proof validated");
        self.emit(&LedgerEvent::ProofValidated {
            proof_id: *proof_id,
            by: actor.id.clone(),
            valid,
            at: now,
        });
        Ok(valid)
    }

    #[must_use]
    pub fn proof(&self, proof_id: &EntryId) -> Option<ExecutionProof> {
        self.proofs.get(proof_id).map(|p| p.clone())
    }

    /// All proofs attesting to a decision hash, oldest first.
    #[must_use]
    pub fn proofs_for_hash(&self, decision_hash: &ContentHash) -> Vec<ExecutionProof> {
        let mut proofs: Vec<ExecutionProof> = self
            .proofs
            .iter()
            .filter(|p| &p.decision_hash == decision_hash)
            .map(|p| p.clone())
            .collect();
        proofs.sort_by_key(|p| p.submitted_at);
        proofs
    }

    // ------------------------------------------------------------------
    // Signer lifecycle
    // ------------------------------------------------------------------

    pub fn authorize_signer(&self, actor: &Actor, signer_id: &str) -> LedgerResult<()> {
        if self.signers.authorize(actor, signer_id)? {
            self.emit(&LedgerEvent::SignerAuthorized {
                signer: signer_id.to_string(),
                by: actor.id.clone(),
                at: Utc::now(),
            });
        }
        Ok(())
    }

    pub fn revoke_signer(&self, actor: &Actor, signer_id: &str) -> LedgerResult<()> {
        if self.signers.revoke(actor, signer_id)? {
            self.emit(&LedgerEvent::SignerRevoked {
                signer: signer_id.to_string(),
                by: actor.id.clone(),
                at: Utc::now(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_authorized_signer(&self, signer_id: &str) -> bool {
        self.signers.is_authorized(signer_id)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Best-effort journaling; the in-memory ledger state is already
    /// updated when this runs, so a journal failure is loud but does not
    /// unwind the change.
    fn emit(&self, event: &LedgerEvent) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(event) {
                error!(?e, "Failed to journal ledger event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{
        AgentId, Decision, FailureCode, FailureDetail, OrderReceipt, Price, Role, Size, Symbol,
        TradeAction,
    };
    use aegis_signing::SigningAuthority;
    use rust_decimal_macros::dec;

    fn owner() -> Actor {
        Actor::new("root", Role::Owner)
    }

    fn validator() -> Actor {
        Actor::new("v1", Role::Validator)
    }

    fn signed_order() -> SignedOrder {
        let authority = SigningAuthority::generate();
        authority
            .sign(&Decision::new(
                Symbol::new("BTC/USD").unwrap(),
                TradeAction::Buy,
                Size::new(dec!(0.1)),
                dec!(0.9),
                AgentId::new("a1"),
            ))
            .unwrap()
    }

    fn filled() -> ExecutionOutcome {
        ExecutionOutcome::Filled(OrderReceipt {
            order_id: "o-1".to_string(),
            filled_quantity: Size::new(dec!(0.1)),
            fill_price: Price::new(dec!(50000)),
        })
    }

    #[test]
    fn test_record_and_fetch() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let order = signed_order();

        let id = ledger.record(&order, &filled(), "root", Utc::now()).unwrap();

        let record = ledger.get(&id).unwrap();
        assert_eq!(record.outcome_code, "FILLED");
        assert_eq!(record.submitter, "root");
        assert!(!record.verified);
    }

    #[test]
    fn test_record_is_idempotent() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let order = signed_order();
        let at = Utc::now();

        let first = ledger.record(&order, &filled(), "root", at).unwrap();
        let second = ledger.record(&order, &filled(), "root", at).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_unauthorized_submitter_rejected() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let result = ledger.record(&signed_order(), &filled(), "stranger", Utc::now());
        assert!(matches!(result, Err(LedgerError::UnauthorizedSigner(_))));
    }

    #[test]
    fn test_tampered_order_rejected_on_record() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let mut order = signed_order();
        order.decision.size = Size::new(dec!(99));

        let result = ledger.record(&order, &filled(), "root", Utc::now());
        assert!(matches!(result, Err(LedgerError::InvalidSignature(_))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_verify_is_one_way() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let id = ledger
            .record(&signed_order(), &filled(), "root", Utc::now())
            .unwrap();

        ledger.verify(&id, &validator()).unwrap();
        let record = ledger.get(&id).unwrap();
        assert!(record.verified);
        assert_eq!(record.verified_by.as_deref(), Some("v1"));

        // Second verify: no-op, verifier unchanged.
        ledger.verify(&id, &owner()).unwrap();
        assert_eq!(ledger.get(&id).unwrap().verified_by.as_deref(), Some("v1"));
    }

    #[test]
    fn test_verify_unknown_entry_fails() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let bogus = decision_entry_id(&signed_order().content_hash, "root", Utc::now());
        assert!(matches!(
            ledger.verify(&bogus, &validator()),
            Err(LedgerError::UnknownEntry(_))
        ));
    }

    #[test]
    fn test_records_by_submitter_sorted() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        ledger.authorize_signer(&owner(), "s1").unwrap();

        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(1);
        ledger.record(&signed_order(), &filled(), "s1", t1).unwrap();
        ledger.record(&signed_order(), &filled(), "s1", t0).unwrap();
        ledger.record(&signed_order(), &filled(), "root", t0).unwrap();

        let records = ledger.records_by_submitter("s1");
        assert_eq!(records.len(), 2);
        assert!(records[0].recorded_at <= records[1].recorded_at);
    }

    #[test]
    fn test_proof_lifecycle() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let order = signed_order();

        let proof_id = ledger
            .submit_proof(
                &order.content_hash,
                order.signature.clone(),
                order.signer_public_key.clone(),
                "root",
                Utc::now(),
            )
            .unwrap();
        assert_eq!(ledger.proof(&proof_id).unwrap().status, ProofStatus::Pending);

        // Agents may not validate.
        let agent = Actor::new("a1", Role::Agent);
        assert!(ledger
            .validate_proof(&proof_id, &order.signer_public_key, &agent)
            .is_err());

        let valid = ledger
            .validate_proof(&proof_id, &order.signer_public_key, &validator())
            .unwrap();
        assert!(valid);
        assert_eq!(ledger.proof(&proof_id).unwrap().status, ProofStatus::Valid);

        // Forward-only: no second validation.
        assert!(matches!(
            ledger.validate_proof(&proof_id, &order.signer_public_key, &validator()),
            Err(LedgerError::AlreadyValidated(_))
        ));
        assert_eq!(ledger.proof(&proof_id).unwrap().status, ProofStatus::Valid);
    }

    #[test]
    fn test_proof_with_unexpected_signer_is_invalid() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let order = signed_order();
        let other_key = SigningAuthority::generate().public_key();

        let proof_id = ledger
            .submit_proof(
                &order.content_hash,
                order.signature.clone(),
                order.signer_public_key.clone(),
                "root",
                Utc::now(),
            )
            .unwrap();

        let valid = ledger
            .validate_proof(&proof_id, &other_key, &validator())
            .unwrap();
        assert!(!valid);
        assert_eq!(ledger.proof(&proof_id).unwrap().status, ProofStatus::Invalid);
    }

    #[test]
    fn test_proof_submission_is_idempotent() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let order = signed_order();
        let at = Utc::now();

        let first = ledger
            .submit_proof(
                &order.content_hash,
                order.signature.clone(),
                order.signer_public_key.clone(),
                "root",
                at,
            )
            .unwrap();
        let second = ledger
            .submit_proof(
                &order.content_hash,
                order.signature.clone(),
                order.signer_public_key.clone(),
                "root",
                at,
            )
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.proofs_for_hash(&order.content_hash).len(), 1);
    }

    #[test]
    fn test_proof_from_unauthorized_submitter_rejected() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let order = signed_order();
        assert!(matches!(
            ledger.submit_proof(
                &order.content_hash,
                order.signature.clone(),
                order.signer_public_key.clone(),
                "stranger",
                Utc::now(),
            ),
            Err(LedgerError::UnauthorizedSigner(_))
        ));
    }

    #[test]
    fn test_failed_outcome_recordable() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        let outcome = ExecutionOutcome::Failed(FailureDetail {
            code: FailureCode::RetriesExhausted,
            message: "timeout x3".to_string(),
        });

        let id = ledger
            .record(&signed_order(), &outcome, "root", Utc::now())
            .unwrap();
        assert_eq!(ledger.get(&id).unwrap().outcome_code, "FAILED:RETRIES_EXHAUSTED");
    }

    #[test]
    fn test_revoked_signer_cannot_record() {
        let ledger = AuditLedger::new(&owner()).unwrap();
        ledger.authorize_signer(&owner(), "s1").unwrap();
        ledger.revoke_signer(&owner(), "s1").unwrap();

        let result = ledger.record(&signed_order(), &filled(), "s1", Utc::now());
        assert!(matches!(result, Err(LedgerError::UnauthorizedSigner(_))));
    }

    #[test]
    fn test_events_journaled() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.jsonl");
        let ledger = AuditLedger::new(&owner())
            .unwrap()
            .with_journal(EventJournal::open(&path).unwrap());

        let at = Utc::now();
        let order = signed_order();
        let id = ledger.record(&order, &filled(), "root", at).unwrap();
        // Duplicate record emits nothing.
        ledger.record(&order, &filled(), "root", at).unwrap();
        ledger.verify(&id, &validator()).unwrap();
        ledger.verify(&id, &validator()).unwrap();

        let events: Vec<LedgerEvent> = EventJournal::open(&path).unwrap().read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LedgerEvent::Recorded { .. }));
        assert!(matches!(events[1], LedgerEvent::Verified { .. }));
    }
}
