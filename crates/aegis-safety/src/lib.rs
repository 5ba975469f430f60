//! Pre-trade safety gate: kill switch, circuit breaker, position limits.
//!
//! The `SafetyGuard` is the only authorization path for trading
//! decisions. Gates evaluate in a strict order (kill switch, breaker,
//! limits) and the first failure denies with a machine-readable reason.
//! Outcome feedback flows one way: executions move the rolling metrics,
//! the metrics move the breaker, the breaker gates future executions.

pub mod breaker;
pub mod error;
pub mod guard;
pub mod kill_switch;
pub mod limits;
pub mod metrics;
pub mod state;

pub use breaker::{
    BreakerConfig, BreakerState, BreakerStatus, RecoveryPolicy, TripContext, TripReason,
};
pub use error::{SafetyError, SafetyResult};
pub use guard::{run_safety_monitor, SafetyConfig, SafetyGuard};
pub use kill_switch::{KillSwitchActivation, KillSwitchMode, KillSwitchState};
pub use limits::PositionLimitPolicy;
pub use metrics::{MetricsSnapshot, MetricsWindow};
pub use state::{SafetyEvent, SafetyState};
