//! The execution coordinator: authorize, sign, dispatch, record.
//!
//! `propose` turns a raw decision into a signed order, signing only after
//! the safety gate allows it. `submit` takes a signed order through
//! verification, replay protection, idempotency claiming, a fresh
//! re-authorization, dispatch with bounded retries, and finally audit
//! recording. Nothing reaches the exchange on any other path.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use aegis_core::{
    DenyReason, Decision, ExchangeClient, ExchangeError, ExecutionOutcome, FailureCode,
    FailureDetail, PortfolioSnapshot, PortfolioSource, SkipReason, TradeAction,
};
use aegis_ledger::AuditLedger;
use aegis_safety::SafetyGuard;
use aegis_signing::{SignedOrder, SigningAuthority, VerificationKey};

use crate::error::{ExecutorResult, SubmitError};
use crate::exchange::{order_request, DispatchClient};
use crate::idempotency::{BeginOutcome, InFlightTracker};
use crate::retry::RetryPolicy;

// ============================================================================
// Configuration
// ============================================================================

/// Coordinator timing and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Oldest signed decision the coordinator will still dispatch.
    #[serde(default = "default_max_decision_age_secs")]
    pub max_decision_age_secs: u64,
    /// Per-call exchange timeout.
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// How long resolved orders stay deduplicated.
    #[serde(default = "default_idempotency_window_secs")]
    pub idempotency_window_secs: u64,
}

fn default_max_decision_age_secs() -> u64 {
    30
}

fn default_dispatch_timeout_ms() -> u64 {
    5000
}

fn default_idempotency_window_secs() -> u64 {
    3600
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_decision_age_secs: default_max_decision_age_secs(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
            retry: RetryPolicy::default(),
            idempotency_window_secs: default_idempotency_window_secs(),
        }
    }
}

// ============================================================================
// Proposal
// ============================================================================

/// Result of proposing a decision: signed and ready to submit, or denied
/// by the safety gate before any signature existed.
#[derive(Debug, Clone)]
pub enum Proposal {
    Signed(SignedOrder),
    Denied(DenyReason),
}

impl Proposal {
    /// The signed order, if the proposal was authorized.
    #[must_use]
    pub fn signed(self) -> Option<SignedOrder> {
        match self {
            Self::Signed(order) => Some(order),
            Self::Denied(_) => None,
        }
    }
}

// ============================================================================
// ExecutionCoordinator
// ============================================================================

pub struct ExecutionCoordinator {
    guard: Arc<SafetyGuard>,
    authority: SigningAuthority,
    ledger: Arc<AuditLedger>,
    exchange: DispatchClient,
    portfolio: Arc<dyn PortfolioSource>,
    tracker: InFlightTracker,
    config: CoordinatorConfig,
    /// Ledger signer identity this coordinator records under.
    submitter: String,
}

impl ExecutionCoordinator {
    pub fn new(
        guard: Arc<SafetyGuard>,
        authority: SigningAuthority,
        ledger: Arc<AuditLedger>,
        exchange: Arc<dyn ExchangeClient>,
        portfolio: Arc<dyn PortfolioSource>,
        config: CoordinatorConfig,
        submitter: impl Into<String>,
    ) -> Self {
        let dispatch =
            DispatchClient::new(exchange, StdDuration::from_millis(config.dispatch_timeout_ms));
        Self {
            guard,
            authority,
            ledger,
            exchange: dispatch,
            portfolio,
            tracker: InFlightTracker::new(),
            config,
            submitter: submitter.into(),
        }
    }

    /// The coordinator's public verification key.
    #[must_use]
    pub fn public_key(&self) -> VerificationKey {
        self.authority.public_key()
    }

    // ------------------------------------------------------------------
    // Propose
    // ------------------------------------------------------------------

    /// Validate and authorize a decision, signing it only on Allow.
    ///
    /// A denied decision never acquires a signature, so nothing denied
    /// here can ever be submitted.
    pub async fn propose(&self, decision: &Decision) -> ExecutorResult<Proposal> {
        decision.validate()?;

        let snapshot = self.snapshot().await?;
        let authorization = self.guard.authorize(decision, &snapshot);
        if let Some(reason) = authorization.deny_reason() {
            info!(
                decision_id = %decision.id,
                reason = %reason,
                "Proposal denied, decision not signed"
            );
            return Ok(Proposal::Denied(reason));
        }

        let order = self.authority.sign(decision)?;
        debug!(
            decision_id = %decision.id,
            content_hash = %order.content_hash,
            "Proposal signed"
        );
        Ok(Proposal::Signed(order))
    }

    // ------------------------------------------------------------------
    // Submit
    // ------------------------------------------------------------------

    /// Submit a signed order for execution.
    ///
    /// The order is re-authorized against a fresh portfolio snapshot
    /// immediately before dispatch; the proposal-time authorization does
    /// not carry over.
    pub async fn submit(&self, order: &SignedOrder) -> ExecutorResult<ExecutionOutcome> {
        if !self.authority.verify(order) {
            error!(
                decision_id = %order.decision.id,
                "SECURITY: submitted order failed verification, refusing to dispatch"
            );
            return Err(SubmitError::Verification(order.decision.id));
        }

        let now = Utc::now();
        self.tracker.purge_older_than(
            Duration::seconds(self.config.idempotency_window_secs as i64),
            now,
        );

        match self.tracker.begin(order.content_hash, now) {
            BeginOutcome::Started => {}
            BeginOutcome::AlreadyInFlight => {
                warn!(
                    decision_id = %order.decision.id,
                    "Duplicate submission while in flight"
                );
                return Ok(ExecutionOutcome::Skipped(SkipReason::DuplicateInFlight));
            }
            BeginOutcome::AlreadyResolved(outcome) => {
                debug!(
                    decision_id = %order.decision.id,
                    outcome = %outcome.code(),
                    "Duplicate submission, returning cached outcome"
                );
                return Ok(outcome);
            }
        }

        // Replay protection: a signature does not stay dispatchable
        // forever.
        let age = order.decision.age(now);
        if age > Duration::seconds(self.config.max_decision_age_secs as i64) {
            warn!(
                decision_id = %order.decision.id,
                age_secs = age.num_seconds(),
                "Signed decision too old to dispatch"
            );
            let outcome = ExecutionOutcome::Failed(FailureDetail {
                code: FailureCode::StaleDecision,
                message: format!("decision is {}s old", age.num_seconds()),
            });
            return Ok(self.finish(order, outcome));
        }

        // Fresh snapshot, fresh authorization. A denial here leaves no
        // trace in the tracker so conditions clearing allows resubmission.
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.tracker.abort(&order.content_hash);
                return Err(e);
            }
        };
        let authorization = self.guard.authorize(&order.decision, &snapshot);
        if let Some(reason) = authorization.deny_reason() {
            info!(
                decision_id = %order.decision.id,
                reason = %reason,
                "Submission denied at dispatch time"
            );
            self.tracker.abort(&order.content_hash);
            return Ok(ExecutionOutcome::Denied(reason));
        }

        let outcome = self.dispatch(order, &snapshot).await;
        Ok(self.finish(order, outcome))
    }

    async fn dispatch(
        &self,
        order: &SignedOrder,
        snapshot: &PortfolioSnapshot,
    ) -> ExecutionOutcome {
        let decision = &order.decision;
        match decision.action {
            TradeAction::Hold => {
                debug!(decision_id = %decision.id, "Hold resolved without dispatch");
                ExecutionOutcome::Skipped(SkipReason::Hold)
            }
            TradeAction::Close => {
                if snapshot.position(&decision.symbol).is_none() {
                    info!(
                        decision_id = %decision.id,
                        symbol = %decision.symbol,
                        "Close with no open position"
                    );
                    return ExecutionOutcome::Skipped(SkipReason::NothingToClose);
                }
                self.with_retries(|| self.exchange.close_position(&decision.symbol))
                    .await
                    .map(ExecutionOutcome::Closed)
                    .unwrap_or_else(ExecutionOutcome::Failed)
            }
            TradeAction::Buy | TradeAction::Sell => {
                // Validated as Buy/Sell, so a request always exists.
                let Some(request) = order_request(decision) else {
                    return ExecutionOutcome::Failed(FailureDetail {
                        code: FailureCode::Rejected,
                        message: "decision maps to no order".to_string(),
                    });
                };
                self.with_retries(|| self.exchange.submit_order(request.clone()))
                    .await
                    .map(ExecutionOutcome::Filled)
                    .unwrap_or_else(ExecutionOutcome::Failed)
            }
        }
    }

    /// Run an exchange call with bounded exponential backoff.
    ///
    /// Transient errors retry up to the attempt budget; permanent errors
    /// resolve immediately.
    async fn with_retries<T, F, Fut>(&self, call: F) -> Result<T, FailureDetail>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, ExchangeError>>,
    {
        let policy = &self.config.retry;
        let mut last_message = String::new();

        for attempt in 1..=policy.max_attempts {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    last_message = e.to_string();
                    if attempt < policy.max_attempts {
                        let delay = policy.delay_for(attempt);
                        warn!(
                            attempt,
                            max_attempts = policy.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Transient dispatch failure, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(ExchangeError::Rejected(message)) => {
                    return Err(FailureDetail {
                        code: FailureCode::Rejected,
                        message,
                    });
                }
                Err(ExchangeError::InsufficientFunds(message)) => {
                    return Err(FailureDetail {
                        code: FailureCode::InsufficientFunds,
                        message,
                    });
                }
                Err(ExchangeError::Transient(_)) => unreachable!("transient handled above"),
            }
        }

        error!(
            attempts = policy.max_attempts,
            last_error = %last_message,
            "Dispatch retries exhausted"
        );
        Err(FailureDetail {
            code: FailureCode::RetriesExhausted,
            message: format!(
                "{} attempts failed, last: {last_message}",
                policy.max_attempts
            ),
        })
    }

    /// Resolve the tracker, feed the metrics, and record the outcome.
    fn finish(&self, order: &SignedOrder, outcome: ExecutionOutcome) -> ExecutionOutcome {
        let now = Utc::now();
        self.tracker.resolve(order.content_hash, outcome.clone(), now);
        self.guard.observe(&outcome);

        if Self::recordable(&outcome) {
            if let Err(e) = self.ledger.record(order, &outcome, &self.submitter, now) {
                // The trade already happened; a missing audit record is a
                // serious operational problem but must not unwind it.
                error!(
                    decision_id = %order.decision.id,
                    outcome = %outcome.code(),
                    ?e,
                    "AUDIT DEGRADED: failed to record execution"
                );
            }
        }
        outcome
    }

    /// Which outcomes enter the ledger: everything that resolved the
    /// decision's intent. Denials and duplicates leave no entry.
    fn recordable(outcome: &ExecutionOutcome) -> bool {
        matches!(
            outcome,
            ExecutionOutcome::Filled(_)
                | ExecutionOutcome::Closed(_)
                | ExecutionOutcome::Failed(_)
                | ExecutionOutcome::Skipped(SkipReason::Hold)
        )
    }

    async fn snapshot(&self) -> ExecutorResult<PortfolioSnapshot> {
        self.portfolio
            .snapshot()
            .await
            .map_err(|e| SubmitError::Portfolio(e.to_string()))
    }
}
