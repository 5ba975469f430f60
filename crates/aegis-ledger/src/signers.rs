//! Signer lifecycle: who may write to the ledger.
//!
//! Only the owner manages the signer set. The owner is a signer from
//! construction and can never revoke itself, so the ledger cannot be
//! locked out of administration.

use aegis_core::Actor;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerEntry {
    pub authorized_by: String,
    pub authorized_at: DateTime<Utc>,
}

/// Registry of authorized ledger signers.
pub struct SignerRegistry {
    owner_id: String,
    signers: DashMap<String, SignerEntry>,
}

impl SignerRegistry {
    /// Create a registry owned by `owner`, who is immediately a signer.
    pub fn new(owner: &Actor) -> LedgerResult<Self> {
        if !owner.is_owner() {
            return Err(LedgerError::Unauthorized(format!(
                "{owner} cannot own a ledger"
            )));
        }
        let signers = DashMap::new();
        signers.insert(
            owner.id.clone(),
            SignerEntry {
                authorized_by: owner.id.clone(),
                authorized_at: Utc::now(),
            },
        );
        Ok(Self {
            owner_id: owner.id.clone(),
            signers,
        })
    }

    #[must_use]
    pub fn is_authorized(&self, signer_id: &str) -> bool {
        self.signers.contains_key(signer_id)
    }

    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Authorize a signer. Idempotent: re-authorizing keeps the original
    /// entry and reports that nothing changed.
    ///
    /// Returns true if the signer set changed.
    pub fn authorize(&self, actor: &Actor, signer_id: &str) -> LedgerResult<bool> {
        self.require_owner(actor)?;

        if self.signers.contains_key(signer_id) {
            info!(signer = signer_id, "Signer already authorized");
            return Ok(false);
        }
        self.signers.insert(
            signer_id.to_string(),
            SignerEntry {
                authorized_by: actor.id.clone(),
                authorized_at: Utc::now(),
            },
        );
        info!(signer = signer_id, by = %actor, "Signer authorized");
        Ok(true)
    }

    /// Revoke a signer. The owner can never revoke itself.
    ///
    /// Returns true if the signer set changed.
    pub fn revoke(&self, actor: &Actor, signer_id: &str) -> LedgerResult<bool> {
        self.require_owner(actor)?;

        if signer_id == self.owner_id {
            warn!(by = %actor, "Owner attempted self-revocation");
            return Err(LedgerError::Unauthorized(
                "the ledger owner cannot revoke itself".to_string(),
            ));
        }
        if self.signers.remove(signer_id).is_none() {
            info!(signer = signer_id, "Signer not in registry, nothing to revoke");
            return Ok(false);
        }
        info!(signer = signer_id, by = %actor, "Signer revoked");
        Ok(true)
    }

    fn require_owner(&self, actor: &Actor) -> LedgerResult<()> {
        if actor.is_owner() && actor.id == self.owner_id {
            Ok(())
        } else {
            warn!(by = %actor, "Rejected signer administration by non-owner");
            Err(LedgerError::Unauthorized(format!(
                "{actor} may not manage signers"
            )))
        }
    }
}
