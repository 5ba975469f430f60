//! Canonical decision encoding and content hashing.
//!
//! Every decision is reduced to a deterministic byte string before
//! hashing, so that two semantically identical decisions always produce
//! the same hash regardless of how they were constructed or serialized.

use aegis_core::Decision;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{SigningError, SigningResult};

/// Encoding version, bumped on any change to the canonical layout.
const ENCODING_VERSION: u8 = 1;

/// SHA-256 digest of a decision's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> SigningResult<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| SigningError::InvalidSignature(format!("invalid hash hex: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            SigningError::InvalidSignature(format!("expected 32 hash bytes, got {}", b.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

fn push_length_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// Encode a decision into its canonical byte representation.
///
/// Layout: version byte, decision id (16 raw uuid bytes), then
/// length-prefixed symbol, a single action tag byte, length-prefixed
/// normalized size and confidence strings, length-prefixed agent id,
/// and the millisecond timestamp as a little-endian i64. Decimals are
/// normalized before encoding so `0.10` and `0.1` hash identically.
#[must_use]
pub fn canonical_bytes(decision: &Decision) -> Vec<u8> {
    let mut buf = Vec::with_capacity(96);
    buf.push(ENCODING_VERSION);
    buf.extend_from_slice(decision.id.as_bytes());
    push_length_prefixed(&mut buf, decision.symbol.as_str().as_bytes());
    buf.push(decision.action.tag());
    push_length_prefixed(&mut buf, decision.size.inner().normalize().to_string().as_bytes());
    push_length_prefixed(&mut buf, decision.confidence.normalize().to_string().as_bytes());
    push_length_prefixed(&mut buf, decision.agent_id.as_str().as_bytes());
    buf.extend_from_slice(&decision.timestamp.timestamp_millis().to_le_bytes());
    buf
}

/// SHA-256 over the canonical encoding of a decision.
#[must_use]
pub fn content_hash(decision: &Decision) -> ContentHash {
    let digest = Sha256::digest(canonical_bytes(decision));
    ContentHash(digest.into())
}
