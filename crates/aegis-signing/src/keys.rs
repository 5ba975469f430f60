//! Ed25519 key and signature wrappers.
//!
//! The secret key never leaves this module's types; `SigningKey` has no
//! serde implementation and a redacted `Debug`, and exported byte buffers
//! are zeroized by the caller via `zeroize`.

use ed25519_dalek::{
    Signature as Ed25519Signature, Signer, SigningKey as Ed25519SigningKey, Verifier, VerifyingKey,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{SigningError, SigningResult};

/// Process-owned Ed25519 signing key.
#[derive(Clone)]
pub struct SigningKey {
    inner: Ed25519SigningKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut secret = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(secret.as_mut());
        Self {
            inner: Ed25519SigningKey::from_bytes(&secret),
        }
    }

    /// Load a key from 32 secret bytes.
    pub fn from_bytes(bytes: &[u8]) -> SigningResult<Self> {
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SigningError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self {
            inner: Ed25519SigningKey::from_bytes(&secret),
        })
    }

    /// The public verification key.
    #[must_use]
    pub fn verification_key(&self) -> VerificationKey {
        VerificationKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(data),
        }
    }

    /// Export the secret bytes. The buffer is zeroized on drop.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.inner.to_bytes())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material.
        write!(f, "SigningKey(..)")
    }
}

/// Public verification key, hex-encoded on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    #[serde(
        serialize_with = "serialize_vk",
        deserialize_with = "deserialize_vk"
    )]
    inner: VerifyingKey,
}

fn serialize_vk<S>(key: &VerifyingKey, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(key.to_bytes()))
}

fn deserialize_vk<'de, D>(deserializer: D) -> std::result::Result<VerifyingKey, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom("invalid key length"))?;
    VerifyingKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
}

impl VerificationKey {
    /// Verify a signature over a message.
    ///
    /// Returns false on any mismatch; never panics on malformed input.
    #[must_use]
    pub fn verify(&self, data: &[u8], signature: &Signature) -> bool {
        self.inner.verify(data, &signature.inner).is_ok()
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> SigningResult<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SigningError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        let inner = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| SigningError::InvalidKey(format!("invalid verification key: {e}")))?;
        Ok(Self { inner })
    }

    /// Hex encoding of the public key bytes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerificationKey({})", self.to_hex())
    }
}

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Ed25519 signature, hex-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(serialize_with = "serialize_sig", deserialize_with = "deserialize_sig")]
    inner: Ed25519Signature,
}

fn serialize_sig<S>(sig: &Ed25519Signature, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(sig.to_bytes()))
}

fn deserialize_sig<'de, D>(deserializer: D) -> std::result::Result<Ed25519Signature, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom("invalid signature length"))?;
    Ok(Ed25519Signature::from_bytes(&bytes))
}

impl Signature {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> SigningResult<Self> {
        let bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            SigningError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self {
            inner: Ed25519Signature::from_bytes(&bytes),
        })
    }

    /// Hex encoding of the signature bytes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
