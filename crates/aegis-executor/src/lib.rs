//! Execution coordination for authorized, signed decisions.
//!
//! The coordinator is the only path to the exchange: decisions are
//! re-authorized against a fresh portfolio snapshot at dispatch time,
//! duplicate submissions are deduplicated by content hash, transient
//! exchange failures retry with bounded backoff, and every resolved
//! outcome is recorded in the audit ledger.

pub mod coordinator;
pub mod error;
pub mod exchange;
pub mod idempotency;
pub mod retry;

pub use coordinator::{CoordinatorConfig, ExecutionCoordinator, Proposal};
pub use error::{ExecutorResult, SubmitError};
pub use exchange::{order_request, DispatchClient};
pub use idempotency::{BeginOutcome, InFlightTracker};
pub use retry::RetryPolicy;
