//! Authorization verdicts, order messages, and execution outcomes.
//!
//! Every denial and failure carries a machine-readable reason code; nothing
//! is silently dropped.

use crate::decimal::{Price, Size};
use crate::decision::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Authorization
// ============================================================================

/// Which configured limit a decision violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitKind {
    SymbolNotAllowed,
    PositionSize,
    TotalExposure,
    Leverage,
    /// No mark price available to value the order.
    UnpricedSymbol,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymbolNotAllowed => write!(f, "SYMBOL_NOT_ALLOWED"),
            Self::PositionSize => write!(f, "POSITION_SIZE_EXCEEDED"),
            Self::TotalExposure => write!(f, "TOTAL_EXPOSURE_EXCEEDED"),
            Self::Leverage => write!(f, "LEVERAGE_EXCEEDED"),
            Self::UnpricedSymbol => write!(f, "UNPRICED_SYMBOL"),
        }
    }
}

/// Why the safety gate denied a decision.
///
/// Ordering matches the gate evaluation order: kill switch, then circuit
/// breaker, then position limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    KillSwitchActive,
    CircuitBreakerTripped,
    LimitExceeded(LimitKind),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KillSwitchActive => write!(f, "KILL_SWITCH_ACTIVE"),
            Self::CircuitBreakerTripped => write!(f, "CIRCUIT_BREAKER_TRIPPED"),
            Self::LimitExceeded(kind) => write!(f, "LIMIT_EXCEEDED:{kind}"),
        }
    }
}

/// Verdict of `SafetyGuard::authorize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    Allow,
    Deny(DenyReason),
}

impl Authorization {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The denial reason, if denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(*reason),
        }
    }
}

// ============================================================================
// Order messages
// ============================================================================

/// Exchange-facing order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order pricing mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit { price: Price },
}

/// Order message sent to the exchange collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub quantity: Size,
}

/// Fill report returned by the exchange collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Exchange-assigned order id.
    pub order_id: String,
    pub filled_quantity: Size,
    pub fill_price: Price,
}

/// Result of closing a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseReport {
    pub symbol: Symbol,
    pub closed_quantity: Size,
    pub realized_pnl: Decimal,
}

// ============================================================================
// Execution outcomes
// ============================================================================

/// Why a submission resolved without an exchange call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Hold decisions carry no order.
    Hold,
    /// Close with no open position in the symbol.
    NothingToClose,
    /// The same signed order is currently being submitted.
    DuplicateInFlight,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hold => write!(f, "HOLD"),
            Self::NothingToClose => write!(f, "NOTHING_TO_CLOSE"),
            Self::DuplicateInFlight => write!(f, "DUPLICATE_IN_FLIGHT"),
        }
    }
}

/// Machine-readable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCode {
    /// Exchange rejected the order (permanent).
    Rejected,
    /// Insufficient funds (permanent).
    InsufficientFunds,
    /// Transient failures exhausted the retry budget.
    RetriesExhausted,
    /// Signed decision exceeded the replay-protection window.
    StaleDecision,
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "REJECTED"),
            Self::InsufficientFunds => write!(f, "INSUFFICIENT_FUNDS"),
            Self::RetriesExhausted => write!(f, "RETRIES_EXHAUSTED"),
            Self::StaleDecision => write!(f, "STALE_DECISION"),
        }
    }
}

/// A resolved failure with its reason code and detail message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub code: FailureCode,
    pub message: String,
}

/// Resolved result of submitting a signed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// Order filled on the exchange.
    Filled(OrderReceipt),
    /// Position closed.
    Closed(CloseReport),
    /// Resolved without an exchange call.
    Skipped(SkipReason),
    /// Pre-dispatch re-authorization denied the decision.
    Denied(DenyReason),
    /// Permanent failure (or exhausted retries).
    Failed(FailureDetail),
}

impl ExecutionOutcome {
    /// Whether this outcome counts as a completed trade attempt for
    /// rolling-metrics purposes (fills, closes, and failures; denials and
    /// skips are not trades).
    #[must_use]
    pub fn is_trade(&self) -> bool {
        matches!(self, Self::Filled(_) | Self::Closed(_) | Self::Failed(_))
    }

    /// Whether a trade attempt succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Filled(_) | Self::Closed(_))
    }

    /// Realized P&L carried by this outcome, if any.
    #[must_use]
    pub fn realized_pnl(&self) -> Option<Decimal> {
        match self {
            Self::Closed(report) => Some(report.realized_pnl),
            _ => None,
        }
    }

    /// Short reason code for logging and audit records.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Filled(_) => "FILLED".to_string(),
            Self::Closed(_) => "CLOSED".to_string(),
            Self::Skipped(reason) => format!("SKIPPED:{reason}"),
            Self::Denied(reason) => format!("DENIED:{reason}"),
            Self::Failed(detail) => format!("FAILED:{}", detail.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_authorization_accessors() {
        assert!(Authorization::Allow.is_allowed());
        let deny = Authorization::Deny(DenyReason::KillSwitchActive);
        assert!(!deny.is_allowed());
        assert_eq!(deny.deny_reason(), Some(DenyReason::KillSwitchActive));
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(DenyReason::KillSwitchActive.to_string(), "KILL_SWITCH_ACTIVE");
        assert_eq!(
            DenyReason::LimitExceeded(LimitKind::TotalExposure).to_string(),
            "LIMIT_EXCEEDED:TOTAL_EXPOSURE_EXCEEDED"
        );
        assert_eq!(FailureCode::StaleDecision.to_string(), "STALE_DECISION");
    }

    #[test]
    fn test_outcome_classification() {
        let filled = ExecutionOutcome::Filled(OrderReceipt {
            order_id: "o-1".to_string(),
            filled_quantity: Size::new(dec!(0.1)),
            fill_price: Price::new(dec!(50000)),
        });
        assert!(filled.is_trade());
        assert!(filled.is_success());
        assert_eq!(filled.realized_pnl(), None);

        let failed = ExecutionOutcome::Failed(FailureDetail {
            code: FailureCode::Rejected,
            message: "bad lot size".to_string(),
        });
        assert!(failed.is_trade());
        assert!(!failed.is_success());

        let denied = ExecutionOutcome::Denied(DenyReason::CircuitBreakerTripped);
        assert!(!denied.is_trade());
        assert_eq!(denied.code(), "DENIED:CIRCUIT_BREAKER_TRIPPED");
    }

    #[test]
    fn test_closed_outcome_carries_pnl() {
        let closed = ExecutionOutcome::Closed(CloseReport {
            symbol: Symbol::new("BTC/USD").unwrap(),
            closed_quantity: Size::new(dec!(0.5)),
            realized_pnl: dec!(-120.5),
        });
        assert_eq!(closed.realized_pnl(), Some(dec!(-120.5)));
    }
}
