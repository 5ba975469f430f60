//! Manual kill switch state.
//!
//! The kill switch is the first gate checked on every authorization and
//! outranks everything else: while active, no decision is authorized
//! regardless of breaker state or limits. It never disengages on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the kill switch does to open positions on activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillSwitchMode {
    /// Block new orders, leave open positions untouched.
    HaltOnly,
    /// Block new orders and close every open position at market.
    ClosePositions,
}

impl fmt::Display for KillSwitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HaltOnly => write!(f, "HALT_ONLY"),
            Self::ClosePositions => write!(f, "CLOSE_POSITIONS"),
        }
    }
}

/// Details of an active kill switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillSwitchActivation {
    pub mode: KillSwitchMode,
    pub reason: String,
    pub activated_by: String,
    pub activated_at: DateTime<Utc>,
}

/// Kill switch state, persisted so an activation survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KillSwitchState {
    /// `Some` while the switch is engaged.
    pub activation: Option<KillSwitchActivation>,
}

impl KillSwitchState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive() {
        let state = KillSwitchState::default();
        assert!(!state.is_active());
    }

    #[test]
    fn test_activation_survives_serde() {
        let state = KillSwitchState {
            activation: Some(KillSwitchActivation {
                mode: KillSwitchMode::ClosePositions,
                reason: "exchange anomaly".to_string(),
                activated_by: "ops-1".to_string(),
                activated_at: Utc::now(),
            }),
        };

        let json = serde_json::to_string(&state).unwrap();
        let restored: KillSwitchState = serde_json::from_str(&json).unwrap();
        assert!(restored.is_active());
        assert_eq!(restored, state);
    }
}
