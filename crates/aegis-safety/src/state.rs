//! Combined safety state and journaled safety events.

use crate::breaker::{BreakerState, TripReason};
use crate::kill_switch::{KillSwitchMode, KillSwitchState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the safety gate persists: breaker plus kill switch.
///
/// Held behind a single lock so authorization sees one consistent view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyState {
    pub breaker: BreakerState,
    pub kill_switch: KillSwitchState,
}

/// Safety transitions appended to the event journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SafetyEvent {
    BreakerTripped {
        reason: TripReason,
        at: DateTime<Utc>,
    },
    BreakerCooldown {
        at: DateTime<Utc>,
    },
    BreakerRecovered {
        /// Operator id for confirmed recoveries, `None` for automatic.
        confirmed_by: Option<String>,
        at: DateTime<Utc>,
    },
    BreakerReset {
        by: String,
        justification: String,
        at: DateTime<Utc>,
    },
    KillSwitchActivated {
        by: String,
        mode: KillSwitchMode,
        reason: String,
        at: DateTime<Utc>,
    },
    KillSwitchDeactivated {
        by: String,
        at: DateTime<Utc>,
    },
}
