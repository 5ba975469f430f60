//! Circuit breaker state machine and trip conditions.
//!
//! The breaker moves between three states:
//!
//! - `Normal`: trading allowed, conditions evaluated every tick.
//! - `Tripped`: trading blocked until the cooldown period elapses.
//! - `Cooldown`: trading still blocked; a clean evaluation recovers to
//!   `Normal` (automatically or after operator confirmation), a dirty
//!   one re-trips.
//!
//! Transitions happen only on evaluation ticks, with one exception: the
//! consecutive-failure threshold trips immediately when crossed, so a
//! failing exchange cannot burn the whole window between ticks.

use crate::metrics::MetricsSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Status and trip reasons
// ============================================================================

/// Breaker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerStatus {
    #[default]
    Normal,
    Tripped,
    Cooldown,
}

impl fmt::Display for BreakerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Tripped => write!(f, "TRIPPED"),
            Self::Cooldown => write!(f, "COOLDOWN"),
        }
    }
}

/// Which condition tripped the breaker, with the observed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TripReason {
    DailyLoss { change_pct: Decimal },
    Drawdown { drawdown_pct: Decimal },
    TradeVelocity { trades_last_hour: usize },
    ErrorRate { error_rate_pct: Decimal },
    ConsecutiveFailures { count: u32 },
}

impl fmt::Display for TripReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyLoss { change_pct } => {
                write!(f, "Daily loss {change_pct}%")
            }
            Self::Drawdown { drawdown_pct } => {
                write!(f, "Drawdown {drawdown_pct}% from peak")
            }
            Self::TradeVelocity { trades_last_hour } => {
                write!(f, "Trade velocity {trades_last_hour}/hour")
            }
            Self::ErrorRate { error_rate_pct } => {
                write!(f, "Error rate {error_rate_pct}%")
            }
            Self::ConsecutiveFailures { count } => {
                write!(f, "Consecutive failures: {count}")
            }
        }
    }
}

/// Context recorded when the breaker trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripContext {
    pub reason: TripReason,
    pub tripped_at: DateTime<Utc>,
}

/// Serializable breaker state, persisted across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakerState {
    pub status: BreakerStatus,
    /// Context of the last trip, kept through cooldown for diagnostics.
    pub trip: Option<TripContext>,
    /// Set once a cooldown evaluation came back clean under the
    /// confirmation policy; recovery then waits for an operator.
    pub awaiting_confirmation: bool,
}

// ============================================================================
// Configuration
// ============================================================================

/// How the breaker leaves cooldown after a clean evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Return to normal on the first clean cooldown evaluation.
    #[default]
    Automatic,
    /// Hold in cooldown until an operator confirms recovery.
    RequireConfirmation,
}

/// Circuit breaker thresholds and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Daily loss that trips the breaker, in percent (positive number).
    #[serde(default = "default_max_daily_loss_pct")]
    pub max_daily_loss_pct: Decimal,
    /// Drawdown from equity peak that trips the breaker, in percent.
    #[serde(default = "default_max_drawdown_pct")]
    pub max_drawdown_pct: Decimal,
    /// Maximum trades in the rolling hour window.
    #[serde(default = "default_max_trades_per_hour")]
    pub max_trades_per_hour: usize,
    /// Maximum failure share of the rolling window, in percent.
    #[serde(default = "default_max_error_rate_pct")]
    pub max_error_rate_pct: Decimal,
    /// Consecutive failures that trip the breaker immediately.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Seconds between evaluation ticks.
    #[serde(default = "default_evaluation_interval_secs")]
    pub evaluation_interval_secs: u64,
    /// Seconds the breaker stays tripped before entering cooldown.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default)]
    pub recovery: RecoveryPolicy,
}

fn default_max_daily_loss_pct() -> Decimal {
    dec!(10)
}

fn default_max_drawdown_pct() -> Decimal {
    dec!(15)
}

fn default_max_trades_per_hour() -> usize {
    50
}

fn default_max_error_rate_pct() -> Decimal {
    dec!(10)
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_evaluation_interval_secs() -> u64 {
    30
}

fn default_cooldown_secs() -> u64 {
    300
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: default_max_daily_loss_pct(),
            max_drawdown_pct: default_max_drawdown_pct(),
            max_trades_per_hour: default_max_trades_per_hour(),
            max_error_rate_pct: default_max_error_rate_pct(),
            max_consecutive_failures: default_max_consecutive_failures(),
            evaluation_interval_secs: default_evaluation_interval_secs(),
            cooldown_secs: default_cooldown_secs(),
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl BreakerConfig {
    /// Check the metrics snapshot against every trip condition.
    ///
    /// Conditions are checked in a fixed order; the first breach wins.
    #[must_use]
    pub fn breach(&self, metrics: &MetricsSnapshot) -> Option<TripReason> {
        if metrics.daily_change_pct <= -self.max_daily_loss_pct {
            return Some(TripReason::DailyLoss {
                change_pct: metrics.daily_change_pct,
            });
        }
        if metrics.drawdown_pct >= self.max_drawdown_pct {
            return Some(TripReason::Drawdown {
                drawdown_pct: metrics.drawdown_pct,
            });
        }
        if metrics.trades_last_hour > self.max_trades_per_hour {
            return Some(TripReason::TradeVelocity {
                trades_last_hour: metrics.trades_last_hour,
            });
        }
        if metrics.error_rate_pct > self.max_error_rate_pct {
            return Some(TripReason::ErrorRate {
                error_rate_pct: metrics.error_rate_pct,
            });
        }
        if metrics.consecutive_failures >= self.max_consecutive_failures {
            return Some(TripReason::ConsecutiveFailures {
                count: metrics.consecutive_failures,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_metrics() -> MetricsSnapshot {
        MetricsSnapshot {
            trades_last_hour: 5,
            failures_last_hour: 0,
            error_rate_pct: Decimal::ZERO,
            consecutive_failures: 0,
            daily_change_pct: dec!(1.2),
            drawdown_pct: dec!(0.5),
        }
    }

    #[test]
    fn test_healthy_metrics_no_breach() {
        let config = BreakerConfig::default();
        assert_eq!(config.breach(&healthy_metrics()), None);
    }

    #[test]
    fn test_daily_loss_breach_at_threshold() {
        let config = BreakerConfig::default();
        let mut metrics = healthy_metrics();

        metrics.daily_change_pct = dec!(-9.9);
        assert_eq!(config.breach(&metrics), None);

        metrics.daily_change_pct = dec!(-10);
        assert!(matches!(
            config.breach(&metrics),
            Some(TripReason::DailyLoss { .. })
        ));
    }

    #[test]
    fn test_drawdown_breach() {
        let config = BreakerConfig::default();
        let mut metrics = healthy_metrics();

        metrics.drawdown_pct = dec!(15);
        assert!(matches!(
            config.breach(&metrics),
            Some(TripReason::Drawdown { .. })
        ));
    }

    #[test]
    fn test_velocity_breach_only_above_limit() {
        let config = BreakerConfig::default();
        let mut metrics = healthy_metrics();

        metrics.trades_last_hour = 50;
        assert_eq!(config.breach(&metrics), None);

        metrics.trades_last_hour = 51;
        assert!(matches!(
            config.breach(&metrics),
            Some(TripReason::TradeVelocity { .. })
        ));
    }

    #[test]
    fn test_consecutive_failures_breach() {
        let config = BreakerConfig::default();
        let mut metrics = healthy_metrics();

        metrics.consecutive_failures = 4;
        assert_eq!(config.breach(&metrics), None);

        metrics.consecutive_failures = 5;
        assert!(matches!(
            config.breach(&metrics),
            Some(TripReason::ConsecutiveFailures { count: 5 })
        ));
    }

    #[test]
    fn test_first_breach_wins() {
        let config = BreakerConfig::default();
        let mut metrics = healthy_metrics();
        metrics.daily_change_pct = dec!(-20);
        metrics.consecutive_failures = 10;

        assert!(matches!(
            config.breach(&metrics),
            Some(TripReason::DailyLoss { .. })
        ));
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: BreakerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_daily_loss_pct, dec!(10));
        assert_eq!(config.max_trades_per_hour, 50);
        assert_eq!(config.cooldown_secs, 300);
        assert_eq!(config.recovery, RecoveryPolicy::Automatic);
    }
}
