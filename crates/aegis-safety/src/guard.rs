//! The safety gate: single authorization entry point for all decisions.
//!
//! Gate order is fixed: kill switch, then circuit breaker, then position
//! limits. The first failing gate denies the decision; later gates are
//! not evaluated.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use aegis_core::{
    Actor, Authorization, Decision, DenyReason, ExchangeClient, ExecutionOutcome,
    PortfolioSnapshot, PortfolioSource,
};
use aegis_persistence::{EventJournal, StateStore};
use serde::{Deserialize, Serialize};

use crate::breaker::{BreakerConfig, BreakerState, BreakerStatus, RecoveryPolicy, TripContext, TripReason};
use crate::error::{SafetyError, SafetyResult};
use crate::kill_switch::{KillSwitchActivation, KillSwitchMode};
use crate::limits::PositionLimitPolicy;
use crate::metrics::MetricsWindow;
use crate::state::{SafetyEvent, SafetyState};

// ============================================================================
// Configuration
// ============================================================================

/// Top-level safety configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub limits: PositionLimitPolicy,
}

// ============================================================================
// SafetyGuard
// ============================================================================

/// Thread-safe safety gate; share via `Arc<SafetyGuard>`.
pub struct SafetyGuard {
    config: BreakerConfig,
    policy: PositionLimitPolicy,
    state: RwLock<SafetyState>,
    metrics: Mutex<MetricsWindow>,
    exchange: Option<Arc<dyn ExchangeClient>>,
    portfolio: Option<Arc<dyn PortfolioSource>>,
    store: Option<StateStore>,
    journal: Option<EventJournal>,
}

impl SafetyGuard {
    #[must_use]
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config: config.breaker,
            policy: config.limits,
            state: RwLock::new(SafetyState::default()),
            metrics: Mutex::new(MetricsWindow::new()),
            exchange: None,
            portfolio: None,
            store: None,
            journal: None,
        }
    }

    /// Attach the exchange used to flatten positions on
    /// `KillSwitchMode::ClosePositions`.
    #[must_use]
    pub fn with_exchange(mut self, exchange: Arc<dyn ExchangeClient>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Attach the portfolio source polled by the safety monitor.
    #[must_use]
    pub fn with_portfolio(mut self, portfolio: Arc<dyn PortfolioSource>) -> Self {
        self.portfolio = Some(portfolio);
        self
    }

    /// Attach durable storage and restore any persisted state.
    ///
    /// A kill switch or tripped breaker that was active at shutdown is
    /// active again after restart.
    pub fn with_persistence(
        mut self,
        store: StateStore,
        journal: EventJournal,
    ) -> SafetyResult<Self> {
        if let Some(saved) = store.load::<SafetyState>()? {
            info!(
                breaker = %saved.breaker.status,
                kill_switch = saved.kill_switch.is_active(),
                "Restored safety state"
            );
            *self.state.write() = saved;
        }
        self.store = Some(store);
        self.journal = Some(journal);
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    /// Authorize a decision against the current safety state.
    ///
    /// Evaluates under a single read lock so a kill-switch flip cannot
    /// interleave with the breaker check.
    #[must_use]
    pub fn authorize(&self, decision: &Decision, snapshot: &PortfolioSnapshot) -> Authorization {
        let state = self.state.read();

        if state.kill_switch.is_active() {
            warn!(
                decision_id = %decision.id,
                symbol = %decision.symbol,
                "Decision denied: kill switch active"
            );
            return Authorization::Deny(DenyReason::KillSwitchActive);
        }

        // Cooldown still blocks: the breaker only readmits trading once
        // it has transitioned back to Normal.
        if state.breaker.status != BreakerStatus::Normal {
            warn!(
                decision_id = %decision.id,
                symbol = %decision.symbol,
                breaker = %state.breaker.status,
                "Decision denied: circuit breaker engaged"
            );
            return Authorization::Deny(DenyReason::CircuitBreakerTripped);
        }

        if let Err(kind) = self.policy.check(decision, snapshot) {
            warn!(
                decision_id = %decision.id,
                symbol = %decision.symbol,
                limit = %kind,
                "Decision denied: limit exceeded"
            );
            return Authorization::Deny(DenyReason::LimitExceeded(kind));
        }

        debug!(
            decision_id = %decision.id,
            symbol = %decision.symbol,
            action = %decision.action,
            "Decision authorized"
        );
        Authorization::Allow
    }

    // ------------------------------------------------------------------
    // Metrics feedback
    // ------------------------------------------------------------------

    /// Feed a resolved execution outcome into the rolling metrics.
    ///
    /// Denials and skips are not trades and do not move the metrics.
    /// Crossing the consecutive-failure threshold trips the breaker
    /// immediately instead of waiting for the next tick.
    pub fn observe(&self, outcome: &ExecutionOutcome) {
        if !outcome.is_trade() {
            return;
        }

        let now = Utc::now();
        let streak = self.metrics.lock().record_trade(now, outcome.is_success());
        trace!(outcome = %outcome.code(), streak, "Observed trade outcome");

        if streak >= self.config.max_consecutive_failures {
            self.trip(TripReason::ConsecutiveFailures { count: streak }, now);
        }
    }

    /// Record an equity observation for daily-change and drawdown math.
    pub fn update_equity(&self, equity: Decimal, at: DateTime<Utc>) {
        self.metrics.lock().update_equity(equity, at);
    }

    // ------------------------------------------------------------------
    // Breaker state machine
    // ------------------------------------------------------------------

    /// Run one breaker evaluation at the current time.
    pub fn evaluate_tick(&self) {
        self.evaluate_tick_at(Utc::now());
    }

    /// Run one breaker evaluation at an explicit time.
    pub fn evaluate_tick_at(&self, now: DateTime<Utc>) {
        let metrics = self.metrics.lock().snapshot(now);
        let status = self.state.read().breaker.status;

        match status {
            BreakerStatus::Normal => {
                if let Some(reason) = self.config.breach(&metrics) {
                    self.trip(reason, now);
                }
            }
            BreakerStatus::Tripped => {
                let tripped_at = self
                    .state
                    .read()
                    .breaker
                    .trip
                    .as_ref()
                    .map(|t| t.tripped_at);
                let elapsed = tripped_at.map(|t| now - t);
                if elapsed >= Some(Duration::seconds(self.config.cooldown_secs as i64)) {
                    self.enter_cooldown(now);
                }
            }
            BreakerStatus::Cooldown => {
                if let Some(reason) = self.config.breach(&metrics) {
                    self.trip(reason, now);
                } else {
                    match self.config.recovery {
                        RecoveryPolicy::Automatic => self.recover(None, now),
                        RecoveryPolicy::RequireConfirmation => self.await_confirmation(),
                    }
                }
            }
        }
    }

    fn trip(&self, reason: TripReason, now: DateTime<Utc>) {
        let snapshot = {
            let mut state = self.state.write();
            if state.breaker.status == BreakerStatus::Tripped {
                return;
            }
            state.breaker.status = BreakerStatus::Tripped;
            state.breaker.trip = Some(TripContext {
                reason: reason.clone(),
                tripped_at: now,
            });
            state.breaker.awaiting_confirmation = false;
            state.clone()
        };

        error!(reason = %reason, "CIRCUIT BREAKER TRIPPED");
        self.persist(&snapshot);
        self.record_event(&SafetyEvent::BreakerTripped { reason, at: now });
    }

    fn enter_cooldown(&self, now: DateTime<Utc>) {
        let snapshot = {
            let mut state = self.state.write();
            state.breaker.status = BreakerStatus::Cooldown;
            state.clone()
        };

        info!("Circuit breaker entering cooldown");
        self.persist(&snapshot);
        self.record_event(&SafetyEvent::BreakerCooldown { at: now });
    }

    fn await_confirmation(&self) {
        let mut state = self.state.write();
        if !state.breaker.awaiting_confirmation {
            state.breaker.awaiting_confirmation = true;
            info!("Circuit breaker healthy, awaiting operator confirmation to recover");
        }
    }

    fn recover(&self, confirmed_by: Option<String>, now: DateTime<Utc>) {
        let snapshot = {
            let mut state = self.state.write();
            state.breaker = BreakerState::default();
            state.clone()
        };
        self.metrics.lock().clear_failures();

        info!(confirmed_by = ?confirmed_by, "Circuit breaker recovered to normal");
        self.persist(&snapshot);
        self.record_event(&SafetyEvent::BreakerRecovered { confirmed_by, at: now });
    }

    /// Confirm recovery out of cooldown under
    /// `RecoveryPolicy::RequireConfirmation`.
    pub fn confirm_recovery(&self, actor: &Actor) -> SafetyResult<()> {
        self.require_safety_admin(actor)?;

        let status = self.state.read().breaker.status;
        if status != BreakerStatus::Cooldown {
            return Err(SafetyError::InvalidState(format!(
                "cannot confirm recovery while breaker is {status}"
            )));
        }

        self.recover(Some(actor.id.clone()), Utc::now());
        Ok(())
    }

    /// Force the breaker back to normal with a recorded justification.
    pub fn reset_breaker(&self, actor: &Actor, justification: &str) -> SafetyResult<()> {
        self.require_safety_admin(actor)?;
        if justification.trim().is_empty() {
            return Err(SafetyError::InvalidState(
                "breaker reset requires a justification".to_string(),
            ));
        }

        let now = Utc::now();
        let snapshot = {
            let mut state = self.state.write();
            state.breaker = BreakerState::default();
            state.clone()
        };
        self.metrics.lock().clear_failures();

        warn!(by = %actor, justification, "Circuit breaker manually reset");
        self.persist(&snapshot);
        self.record_event(&SafetyEvent::BreakerReset {
            by: actor.id.clone(),
            justification: justification.to_string(),
            at: now,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Kill switch
    // ------------------------------------------------------------------

    /// Engage the kill switch.
    ///
    /// Re-activating an active switch is a logged no-op that keeps the
    /// original activation. With `ClosePositions`, every open position is
    /// flattened best-effort after the switch is already blocking new
    /// orders.
    pub async fn activate_kill_switch(
        &self,
        actor: &Actor,
        mode: KillSwitchMode,
        reason: &str,
    ) -> SafetyResult<()> {
        self.require_safety_admin(actor)?;

        let now = Utc::now();
        let snapshot = {
            let mut state = self.state.write();
            if let Some(active) = &state.kill_switch.activation {
                warn!(
                    by = %actor,
                    active_since = %active.activated_at,
                    "Kill switch already active, ignoring activation"
                );
                return Ok(());
            }
            state.kill_switch.activation = Some(KillSwitchActivation {
                mode,
                reason: reason.to_string(),
                activated_by: actor.id.clone(),
                activated_at: now,
            });
            state.clone()
        };

        error!(by = %actor, mode = %mode, reason, "KILL SWITCH ACTIVATED");
        self.persist(&snapshot);
        self.record_event(&SafetyEvent::KillSwitchActivated {
            by: actor.id.clone(),
            mode,
            reason: reason.to_string(),
            at: now,
        });

        if mode == KillSwitchMode::ClosePositions {
            self.close_all_positions().await;
        }
        Ok(())
    }

    /// Disengage the kill switch. No-op if it is not active.
    pub fn deactivate_kill_switch(&self, actor: &Actor) -> SafetyResult<()> {
        self.require_safety_admin(actor)?;

        let now = Utc::now();
        let snapshot = {
            let mut state = self.state.write();
            if state.kill_switch.activation.take().is_none() {
                info!(by = %actor, "Kill switch not active, nothing to deactivate");
                return Ok(());
            }
            state.clone()
        };

        info!(by = %actor, "Kill switch deactivated");
        self.persist(&snapshot);
        self.record_event(&SafetyEvent::KillSwitchDeactivated {
            by: actor.id.clone(),
            at: now,
        });
        Ok(())
    }

    async fn close_all_positions(&self) {
        let (Some(exchange), Some(portfolio)) = (&self.exchange, &self.portfolio) else {
            warn!("Cannot close positions: no exchange or portfolio source attached");
            return;
        };

        let snapshot = match portfolio.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(?e, "Failed to fetch portfolio for kill-switch close-out");
                return;
            }
        };

        for position in &snapshot.positions {
            match exchange.close_position(&position.symbol).await {
                Ok(report) => info!(
                    symbol = %report.symbol,
                    quantity = %report.closed_quantity,
                    pnl = %report.realized_pnl,
                    "Closed position for kill switch"
                ),
                Err(e) => error!(
                    symbol = %position.symbol,
                    ?e,
                    "Failed to close position for kill switch"
                ),
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn breaker_status(&self) -> BreakerStatus {
        self.state.read().breaker.status
    }

    #[must_use]
    pub fn trip_context(&self) -> Option<TripContext> {
        self.state.read().breaker.trip.clone()
    }

    #[must_use]
    pub fn kill_switch_active(&self) -> bool {
        self.state.read().kill_switch.is_active()
    }

    #[must_use]
    pub fn breaker_config(&self) -> &BreakerConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_safety_admin(&self, actor: &Actor) -> SafetyResult<()> {
        if actor.can_administer_safety() {
            Ok(())
        } else {
            warn!(by = %actor, "Rejected safety administration by unprivileged actor");
            Err(SafetyError::Unauthorized(format!(
                "{actor} may not administer safety controls"
            )))
        }
    }

    /// Best-effort persistence: a storage failure is loud but never
    /// blocks a safety transition.
    fn persist(&self, state: &SafetyState) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(state) {
                error!(?e, "Failed to persist safety state");
            }
        }
    }

    fn record_event(&self, event: &SafetyEvent) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(event) {
                error!(?e, "Failed to journal safety event");
            }
        }
    }
}

// ============================================================================
// Monitor loop
// ============================================================================

/// Periodic breaker evaluation driver.
///
/// Polls the attached portfolio source for equity, then runs one breaker
/// evaluation per interval until the shutdown signal flips to true.
pub async fn run_safety_monitor(guard: Arc<SafetyGuard>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
        guard.config.evaluation_interval_secs,
    ));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(
        interval_secs = guard.config.evaluation_interval_secs,
        "Safety monitor started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(portfolio) = &guard.portfolio {
                    match portfolio.snapshot().await {
                        Ok(snapshot) => guard.update_equity(snapshot.equity, Utc::now()),
                        Err(e) => warn!(?e, "Portfolio snapshot failed, evaluating on stale equity"),
                    }
                }
                guard.evaluate_tick();
            }
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!("Safety monitor shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{
        AgentId, FailureCode, FailureDetail, OrderReceipt, Price, Size, SkipReason, Symbol,
        TradeAction,
    };
    use rust_decimal_macros::dec;

    fn guard() -> SafetyGuard {
        SafetyGuard::new(SafetyConfig::default())
    }

    fn operator() -> Actor {
        Actor::new("ops-1", aegis_core::Role::Operator)
    }

    fn agent_actor() -> Actor {
        Actor::new("a1", aegis_core::Role::Agent)
    }

    fn buy_decision() -> Decision {
        Decision::new(
            Symbol::new("BTC/USD").unwrap(),
            TradeAction::Buy,
            Size::new(dec!(0.1)),
            dec!(0.9),
            AgentId::new("a1"),
        )
    }

    fn priced_snapshot() -> PortfolioSnapshot {
        let mut snapshot = PortfolioSnapshot::with_equity(dec!(100000));
        snapshot
            .marks
            .insert(Symbol::new("BTC/USD").unwrap(), Price::new(dec!(50000)));
        snapshot
    }

    fn failed_outcome() -> ExecutionOutcome {
        ExecutionOutcome::Failed(FailureDetail {
            code: FailureCode::Rejected,
            message: "rejected".to_string(),
        })
    }

    fn filled_outcome() -> ExecutionOutcome {
        ExecutionOutcome::Filled(OrderReceipt {
            order_id: "o-1".to_string(),
            filled_quantity: Size::new(dec!(0.1)),
            fill_price: Price::new(dec!(50000)),
        })
    }

    #[tokio::test]
    async fn test_kill_switch_outranks_everything() {
        let guard = guard();
        guard
            .activate_kill_switch(&operator(), KillSwitchMode::HaltOnly, "drill")
            .await
            .unwrap();

        let auth = guard.authorize(&buy_decision(), &priced_snapshot());
        assert_eq!(auth, Authorization::Deny(DenyReason::KillSwitchActive));

        guard.deactivate_kill_switch(&operator()).unwrap();
        assert!(guard
            .authorize(&buy_decision(), &priced_snapshot())
            .is_allowed());
    }

    #[tokio::test]
    async fn test_reactivation_is_noop() {
        let guard = guard();
        guard
            .activate_kill_switch(&operator(), KillSwitchMode::HaltOnly, "first")
            .await
            .unwrap();
        guard
            .activate_kill_switch(&operator(), KillSwitchMode::ClosePositions, "second")
            .await
            .unwrap();

        assert!(guard.kill_switch_active());
        // Original activation preserved.
        let state = guard.state.read().kill_switch.clone();
        assert_eq!(state.activation.unwrap().reason, "first");
    }

    #[tokio::test]
    async fn test_agent_cannot_administer() {
        let guard = guard();
        let result = guard
            .activate_kill_switch(&agent_actor(), KillSwitchMode::HaltOnly, "nope")
            .await;
        assert!(matches!(result, Err(SafetyError::Unauthorized(_))));
        assert!(!guard.kill_switch_active());

        assert!(matches!(
            guard.reset_breaker(&agent_actor(), "nope"),
            Err(SafetyError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_consecutive_failures_trip_immediately() {
        let guard = guard();

        for _ in 0..4 {
            guard.observe(&failed_outcome());
            assert_eq!(guard.breaker_status(), BreakerStatus::Normal);
        }
        // Fifth consecutive failure trips without waiting for a tick.
        guard.observe(&failed_outcome());
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);

        let trip = guard.trip_context().unwrap();
        assert!(matches!(
            trip.reason,
            TripReason::ConsecutiveFailures { count: 5 }
        ));
    }

    #[test]
    fn test_success_resets_streak() {
        let guard = guard();

        for _ in 0..4 {
            guard.observe(&failed_outcome());
        }
        guard.observe(&filled_outcome());
        for _ in 0..4 {
            guard.observe(&failed_outcome());
        }
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);
    }

    #[test]
    fn test_denials_do_not_move_metrics() {
        let guard = guard();

        for _ in 0..10 {
            guard.observe(&ExecutionOutcome::Denied(DenyReason::KillSwitchActive));
            guard.observe(&ExecutionOutcome::Skipped(SkipReason::Hold));
        }
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);
    }

    #[test]
    fn test_daily_loss_trips_on_tick() {
        let guard = guard();
        let now = Utc::now();

        guard.update_equity(dec!(100000), now);
        guard.update_equity(dec!(89000), now);
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);

        guard.evaluate_tick_at(now);
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);
        assert!(matches!(
            guard.trip_context().unwrap().reason,
            TripReason::DailyLoss { .. }
        ));
    }

    #[test]
    fn test_tripped_breaker_denies() {
        let guard = guard();
        let now = Utc::now();
        guard.update_equity(dec!(100000), now);
        guard.update_equity(dec!(80000), now);
        guard.evaluate_tick_at(now);

        let auth = guard.authorize(&buy_decision(), &priced_snapshot());
        assert_eq!(
            auth,
            Authorization::Deny(DenyReason::CircuitBreakerTripped)
        );
    }

    #[test]
    fn test_full_recovery_cycle_automatic() {
        let guard = guard();
        let t0 = Utc::now();

        // Trip on drawdown.
        guard.update_equity(dec!(100000), t0);
        guard.update_equity(dec!(80000), t0);
        guard.evaluate_tick_at(t0);
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);

        // Before cooldown elapses: still tripped.
        let t1 = t0 + Duration::seconds(100);
        guard.evaluate_tick_at(t1);
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);

        // After cooldown: probation.
        let t2 = t0 + Duration::seconds(301);
        guard.evaluate_tick_at(t2);
        assert_eq!(guard.breaker_status(), BreakerStatus::Cooldown);

        // Equity recovers within drawdown and daily-loss bands; next
        // tick returns to normal.
        let t3 = t2 + Duration::seconds(30);
        guard.update_equity(dec!(99000), t3);
        guard.evaluate_tick_at(t3);
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);
        assert!(guard
            .authorize(&buy_decision(), &priced_snapshot())
            .is_allowed());
    }

    #[test]
    fn test_cooldown_retrips_on_breach() {
        let guard = guard();
        let t0 = Utc::now();

        guard.update_equity(dec!(100000), t0);
        guard.update_equity(dec!(80000), t0);
        guard.evaluate_tick_at(t0);

        let t1 = t0 + Duration::seconds(301);
        guard.evaluate_tick_at(t1);
        assert_eq!(guard.breaker_status(), BreakerStatus::Cooldown);

        // Still 20% down: breach persists, breaker re-trips.
        guard.evaluate_tick_at(t1 + Duration::seconds(30));
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);
    }

    #[test]
    fn test_confirmation_policy_holds_cooldown() {
        let config = SafetyConfig {
            breaker: BreakerConfig {
                recovery: RecoveryPolicy::RequireConfirmation,
                ..Default::default()
            },
            ..Default::default()
        };
        let guard = SafetyGuard::new(config);
        let t0 = Utc::now();

        guard.update_equity(dec!(100000), t0);
        guard.update_equity(dec!(80000), t0);
        guard.evaluate_tick_at(t0);

        let t1 = t0 + Duration::seconds(301);
        guard.evaluate_tick_at(t1);
        guard.update_equity(dec!(99000), t1);

        // Healthy ticks alone do not recover.
        guard.evaluate_tick_at(t1 + Duration::seconds(30));
        guard.evaluate_tick_at(t1 + Duration::seconds(60));
        assert_eq!(guard.breaker_status(), BreakerStatus::Cooldown);

        // Confirmation is privileged.
        assert!(guard.confirm_recovery(&agent_actor()).is_err());
        guard.confirm_recovery(&operator()).unwrap();
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);
    }

    #[test]
    fn test_confirm_recovery_invalid_outside_cooldown() {
        let guard = guard();
        assert!(matches!(
            guard.confirm_recovery(&operator()),
            Err(SafetyError::InvalidState(_))
        ));
    }

    #[test]
    fn test_manual_reset_from_tripped() {
        let guard = guard();
        for _ in 0..5 {
            guard.observe(&failed_outcome());
        }
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);

        guard
            .reset_breaker(&operator(), "exchange outage resolved")
            .unwrap();
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);

        // Streak was cleared: one more failure does not re-trip.
        guard.observe(&failed_outcome());
        assert_eq!(guard.breaker_status(), BreakerStatus::Normal);
    }

    #[test]
    fn test_reset_requires_justification() {
        let guard = guard();
        assert!(matches!(
            guard.reset_breaker(&operator(), "  "),
            Err(SafetyError::InvalidState(_))
        ));
    }

    #[test]
    fn test_state_restored_from_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store_path = temp_dir.path().join("safety.json");
        let journal_path = temp_dir.path().join("safety_events.jsonl");

        {
            let guard = SafetyGuard::new(SafetyConfig::default())
                .with_persistence(
                    StateStore::new(&store_path).unwrap(),
                    EventJournal::open(&journal_path).unwrap(),
                )
                .unwrap();
            for _ in 0..5 {
                guard.observe(&failed_outcome());
            }
            assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);
        }

        // Fresh guard over the same store comes up tripped.
        let guard = SafetyGuard::new(SafetyConfig::default())
            .with_persistence(
                StateStore::new(&store_path).unwrap(),
                EventJournal::open(&journal_path).unwrap(),
            )
            .unwrap();
        assert_eq!(guard.breaker_status(), BreakerStatus::Tripped);

        // And the trip made it into the journal.
        let events: Vec<SafetyEvent> = EventJournal::open(&journal_path)
            .unwrap()
            .read_all()
            .unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, SafetyEvent::BreakerTripped { .. })));
    }
}
