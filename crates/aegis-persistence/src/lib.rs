//! Durable storage for safety state and audit events.
//!
//! Two primitives: an append-only JSON Lines event journal, and an
//! atomic-write state store for small snapshots that must survive
//! restarts.

pub mod error;
pub mod journal;
pub mod state_store;

pub use error::{PersistenceError, PersistenceResult};
pub use journal::EventJournal;
pub use state_store::StateStore;
