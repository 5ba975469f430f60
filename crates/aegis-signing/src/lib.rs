//! Decision signing and verification.
//!
//! The `SigningAuthority` holds the single Ed25519 key owned by the
//! process, binds decisions to signatures over a canonical content hash,
//! and verifies that binding. Any post-hoc modification of a decision
//! field, the hash, or the signature is detectable by `verify`.

pub mod authority;
pub mod error;
pub mod hash;
pub mod keys;

pub use authority::{verify_signed_order, SignedOrder, SigningAuthority};
pub use error::{SigningError, SigningResult};
pub use hash::{canonical_bytes, content_hash, ContentHash};
pub use keys::{Signature, SigningKey, VerificationKey};
