//! Idempotency tracking keyed by content hash.
//!
//! A signed order is identified by its content hash: the same order
//! submitted twice must not reach the exchange twice. The tracker marks
//! orders in flight and caches resolved outcomes for the dedup window.

use aegis_core::ExecutionOutcome;
use aegis_signing::ContentHash;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

/// Result of claiming an order for submission.
#[derive(Debug, Clone, PartialEq)]
pub enum BeginOutcome {
    /// This call owns the submission.
    Started,
    /// Another submission of the same order is still running.
    AlreadyInFlight,
    /// The order already resolved inside the dedup window.
    AlreadyResolved(ExecutionOutcome),
}

#[derive(Debug, Clone)]
enum Entry {
    InFlight { since: DateTime<Utc> },
    Resolved { outcome: ExecutionOutcome, at: DateTime<Utc> },
}

/// Thread-safe in-flight and resolved-order tracker.
#[derive(Default)]
pub struct InFlightTracker {
    entries: DashMap<ContentHash, Entry>,
}

impl InFlightTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim an order for submission.
    pub fn begin(&self, hash: ContentHash, now: DateTime<Utc>) -> BeginOutcome {
        let mut outcome = BeginOutcome::Started;
        self.entries
            .entry(hash)
            .and_modify(|entry| {
                outcome = match entry {
                    Entry::InFlight { .. } => BeginOutcome::AlreadyInFlight,
                    Entry::Resolved { outcome, .. } => {
                        BeginOutcome::AlreadyResolved(outcome.clone())
                    }
                };
            })
            .or_insert(Entry::InFlight { since: now });
        outcome
    }

    /// Store the resolved outcome for an order.
    pub fn resolve(&self, hash: ContentHash, outcome: ExecutionOutcome, at: DateTime<Utc>) {
        self.entries.insert(hash, Entry::Resolved { outcome, at });
    }

    /// Release a claim without caching an outcome, so the order may be
    /// submitted again (authorization denial, portfolio outage).
    pub fn abort(&self, hash: &ContentHash) {
        self.entries.remove(hash);
    }

    /// Drop entries older than the dedup window.
    pub fn purge_older_than(&self, window: Duration, now: DateTime<Utc>) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            let at = match entry {
                Entry::InFlight { since } => *since,
                Entry::Resolved { at, .. } => *at,
            };
            now - at <= window
        });
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(dropped, "Purged expired idempotency entries");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
