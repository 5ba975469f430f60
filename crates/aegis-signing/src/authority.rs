//! The signing authority and the signed order envelope.

use aegis_core::Decision;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SigningResult;
use crate::hash::{content_hash, ContentHash};
use crate::keys::{Signature, SigningKey, VerificationKey};

/// A decision bound to its content hash and an Ed25519 signature.
///
/// Verification recomputes the hash from the embedded decision, so any
/// post-hoc edit to a decision field, the hash, or the signature fails
/// `verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedOrder {
    pub decision: Decision,
    pub content_hash: ContentHash,
    pub signature: Signature,
    pub signer_public_key: VerificationKey,
}

/// Holder of the single process signing key.
///
/// The key never leaves this type. Callers obtain signed orders and the
/// public verification key only.
pub struct SigningAuthority {
    key: SigningKey,
}

impl SigningAuthority {
    /// Wrap an existing key.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Create an authority with a freshly generated key.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(SigningKey::generate())
    }

    /// The public verification key for this authority.
    #[must_use]
    pub fn public_key(&self) -> VerificationKey {
        self.key.verification_key()
    }

    /// Hash and sign an authorized decision.
    pub fn sign(&self, decision: &Decision) -> SigningResult<SignedOrder> {
        let hash = content_hash(decision);
        let signature = self.key.sign(hash.as_bytes());

        debug!(
            decision_id = %decision.id,
            content_hash = %hash,
            "Signed decision"
        );

        Ok(SignedOrder {
            decision: decision.clone(),
            content_hash: hash,
            signature,
            signer_public_key: self.public_key(),
        })
    }

    /// Verify that a signed order was produced by this authority and has
    /// not been modified since signing.
    #[must_use]
    pub fn verify(&self, order: &SignedOrder) -> bool {
        if order.signer_public_key != self.public_key() {
            warn!(
                decision_id = %order.decision.id,
                claimed_key = %order.signer_public_key,
                "Signed order claims a foreign signer key"
            );
            return false;
        }
        verify_signed_order(order)
    }
}

impl std::fmt::Debug for SigningAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningAuthority")
            .field("public_key", &self.public_key())
            .finish()
    }
}

/// Verify a signed order against its own embedded public key.
///
/// Recomputes the content hash from the decision, checks it against the
/// recorded hash, then checks the signature over the hash. A mismatch is
/// logged as a security event and yields `false`; this function never
/// errors on malformed input.
#[must_use]
pub fn verify_signed_order(order: &SignedOrder) -> bool {
    let recomputed = content_hash(&order.decision);
    if recomputed != order.content_hash {
        warn!(
            decision_id = %order.decision.id,
            recorded_hash = %order.content_hash,
            recomputed_hash = %recomputed,
            "SECURITY: signed order content hash mismatch, decision was modified"
        );
        return false;
    }

    let valid = order
        .signer_public_key
        .verify(order.content_hash.as_bytes(), &order.signature);
    if !valid {
        warn!(
            decision_id = %order.decision.id,
            content_hash = %order.content_hash,
            "SECURITY: signed order signature invalid"
        );
    }
    valid
}
