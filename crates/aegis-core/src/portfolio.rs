//! Point-in-time portfolio state used for limit evaluation.
//!
//! A snapshot is a pure value: the safety gate reads it, never mutates it.
//! Exposure math lives here so the limit enforcer stays stateless.

use crate::decimal::{Price, Size};
use crate::decision::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Signed position size (negative = short).
    pub size: Size,
    pub entry_price: Price,
    pub mark_price: Price,
}

impl Position {
    /// Current notional value at mark.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.size.notional(self.mark_price)
    }
}

/// Point-in-time view of the portfolio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Account equity in USD.
    pub equity: Decimal,
    /// Open positions.
    pub positions: Vec<Position>,
    /// Current mark prices, including symbols without an open position.
    pub marks: HashMap<Symbol, Price>,
    /// When this snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Create an empty snapshot with the given equity.
    pub fn with_equity(equity: Decimal) -> Self {
        Self {
            equity,
            positions: Vec::new(),
            marks: HashMap::new(),
            taken_at: Utc::now(),
        }
    }

    /// Total notional exposure across all positions.
    #[must_use]
    pub fn total_exposure(&self) -> Decimal {
        self.positions.iter().map(Position::notional).sum()
    }

    /// Notional exposure in a single symbol.
    #[must_use]
    pub fn symbol_exposure(&self, symbol: &Symbol) -> Decimal {
        self.positions
            .iter()
            .filter(|p| &p.symbol == symbol)
            .map(Position::notional)
            .sum()
    }

    /// Look up the open position for a symbol, if any.
    #[must_use]
    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.iter().find(|p| &p.symbol == symbol)
    }

    /// Mark price for a symbol: explicit mark first, position mark as
    /// fallback.
    #[must_use]
    pub fn mark(&self, symbol: &Symbol) -> Option<Price> {
        self.marks
            .get(symbol)
            .copied()
            .or_else(|| self.position(symbol).map(|p| p.mark_price))
    }
}
