//! Deterministic ledger entry identifiers.
//!
//! Entry ids are SHA-256 digests over a domain tag, the content hash,
//! the submitter id, and the record timestamp. The same inputs always
//! produce the same id, which is what makes `record` idempotent across
//! retries.

use aegis_signing::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{LedgerError, LedgerResult};

/// Domain tag for execution record ids.
const DECISION_DOMAIN: &[u8] = b"aegis.decision.v1";
/// Domain tag for proof ids.
const PROOF_DOMAIN: &[u8] = b"aegis.proof.v1";

/// Deterministic 32-byte ledger entry id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId([u8; 32]);

impl EntryId {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> LedgerResult<Self> {
        let bytes =
            hex::decode(s).map_err(|e| LedgerError::UnknownEntry(format!("bad id hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| LedgerError::UnknownEntry(format!("bad id length {}", b.len())))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.to_hex())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

fn derive_id(domain: &[u8], content: &[u8], submitter: &str, at: DateTime<Utc>) -> EntryId {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(content);
    hasher.update(submitter.as_bytes());
    hasher.update(at.timestamp_millis().to_le_bytes());
    EntryId(hasher.finalize().into())
}

/// Id for an execution record.
#[must_use]
pub fn decision_entry_id(hash: &ContentHash, submitter: &str, at: DateTime<Utc>) -> EntryId {
    derive_id(DECISION_DOMAIN, hash.as_bytes(), submitter, at)
}

/// Id for a proof attesting to a decision hash.
#[must_use]
pub fn proof_entry_id(decision_hash: &[u8; 32], submitter: &str, at: DateTime<Utc>) -> EntryId {
    derive_id(PROOF_DOMAIN, decision_hash, submitter, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{AgentId, Decision, Size, Symbol, TradeAction};
    use aegis_signing::content_hash;
    use rust_decimal_macros::dec;

    fn sample_hash() -> ContentHash {
        content_hash(&Decision::new(
            Symbol::new("BTC/USD").unwrap(),
            TradeAction::Buy,
            Size::new(dec!(0.1)),
            dec!(0.9),
            AgentId::new("a1"),
        ))
    }

    #[test]
    fn test_id_is_deterministic() {
        let hash = sample_hash();
        let at = Utc::now();

        let a = decision_entry_id(&hash, "signer-1", at);
        let b = decision_entry_id(&hash, "signer-1", at);
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_varies_with_inputs() {
        let hash = sample_hash();
        let at = Utc::now();
        let base = decision_entry_id(&hash, "signer-1", at);

        assert_ne!(decision_entry_id(&hash, "signer-2", at), base);
        assert_ne!(
            decision_entry_id(&hash, "signer-1", at + chrono::Duration::milliseconds(1)),
            base
        );
    }

    #[test]
    fn test_domains_are_separated() {
        let hash = sample_hash();
        let at = Utc::now();

        let decision = decision_entry_id(&hash, "signer-1", at);
        let proof = proof_entry_id(hash.as_bytes(), "signer-1", at);
        assert_ne!(decision, proof);
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = decision_entry_id(&sample_hash(), "signer-1", Utc::now());
        assert_eq!(EntryId::from_hex(&id.to_hex()).unwrap(), id);
    }
}
