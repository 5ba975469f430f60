//! Trading decisions proposed by external strategy agents.
//!
//! A `Decision` is immutable once created and is consumed exactly once by
//! the pipeline: validate → authorize → sign → submit. Validation runs
//! before authorization so malformed input never reaches the safety gate.

use crate::decimal::Size;
use crate::error::{CoreError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum tolerated clock skew for decision timestamps in the future.
const MAX_FUTURE_SKEW_SECS: i64 = 5;

/// Proposed trading action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
    /// No market action; resolved without contacting the exchange.
    Hold,
    /// Close the full open position in the decision's symbol.
    Close,
}

impl TradeAction {
    /// Stable single-byte tag used in the canonical signing encoding.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
            Self::Hold => 2,
            Self::Close => 3,
        }
    }

    /// Whether this action places an order on the exchange.
    #[must_use]
    pub fn is_order(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
            Self::Close => write!(f, "CLOSE"),
        }
    }
}

/// Trading symbol in `BASE/QUOTE` form, e.g. `BTC/USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Parse and validate a symbol string.
    pub fn new(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }
        match trimmed.split_once('/') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(CoreError::InvalidSymbol(format!(
                "expected BASE/QUOTE, got '{trimmed}'"
            ))),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Identity of the strategy agent that produced a decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A proposed trading decision awaiting authorization.
///
/// Immutable once created; the pipeline never mutates a decision, it only
/// derives a signed order from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision id.
    pub id: Uuid,
    /// Trading symbol.
    pub symbol: Symbol,
    /// Proposed action.
    pub action: TradeAction,
    /// Order quantity in base units. Zero for Hold; zero on Close means
    /// "the entire open position".
    pub size: Size,
    /// Agent confidence in [0, 1].
    pub confidence: Decimal,
    /// Producing agent.
    pub agent_id: AgentId,
    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Create a new decision stamped with a fresh id and the current time.
    pub fn new(
        symbol: Symbol,
        action: TradeAction,
        size: Size,
        confidence: Decimal,
        agent_id: AgentId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            action,
            size,
            confidence,
            agent_id,
            timestamp: Utc::now(),
        }
    }

    /// Validate decision fields.
    ///
    /// Rejected decisions never reach authorization or signing.
    pub fn validate(&self) -> Result<()> {
        match self.action {
            TradeAction::Buy | TradeAction::Sell => {
                if !self.size.is_positive() {
                    return Err(CoreError::InvalidSize(format!(
                        "{} requires a positive size, got {}",
                        self.action, self.size
                    )));
                }
            }
            TradeAction::Hold | TradeAction::Close => {
                if self.size.inner().is_sign_negative() {
                    return Err(CoreError::InvalidSize(format!(
                        "negative size {} on {}",
                        self.size, self.action
                    )));
                }
            }
        }

        if self.confidence < Decimal::ZERO || self.confidence > Decimal::ONE {
            return Err(CoreError::InvalidConfidence(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }

        if self.agent_id.as_str().trim().is_empty() {
            return Err(CoreError::InvalidAgentId("empty agent id".to_string()));
        }

        let skew = self.timestamp - Utc::now();
        if skew > Duration::seconds(MAX_FUTURE_SKEW_SECS) {
            return Err(CoreError::InvalidTimestamp(format!(
                "decision timestamp {} is in the future",
                self.timestamp
            )));
        }

        Ok(())
    }

    /// Age of this decision relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }
}
