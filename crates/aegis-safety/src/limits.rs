//! Position and exposure limit enforcement.
//!
//! The policy is stateless: each check takes the decision and a fresh
//! portfolio snapshot and returns the first violated limit. Orders are
//! valued at the snapshot's mark price; an order that cannot be valued
//! is rejected rather than waved through.

use aegis_core::{Decision, LimitKind, PortfolioSnapshot, Symbol, TradeAction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Notional position and exposure limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLimitPolicy {
    /// Maximum notional per symbol in USD.
    #[serde(default = "default_max_position_notional")]
    pub max_position_notional: Decimal,
    /// Maximum total notional exposure across all symbols in USD.
    #[serde(default = "default_max_total_exposure")]
    pub max_total_exposure: Decimal,
    /// Maximum total exposure as a multiple of equity.
    #[serde(default = "default_max_leverage")]
    pub max_leverage: Decimal,
    /// Symbols that may be traded. `None` allows every symbol.
    #[serde(default)]
    pub allowed_symbols: Option<HashSet<Symbol>>,
}

fn default_max_position_notional() -> Decimal {
    dec!(10000)
}

fn default_max_total_exposure() -> Decimal {
    dec!(50000)
}

fn default_max_leverage() -> Decimal {
    dec!(20)
}

impl Default for PositionLimitPolicy {
    fn default() -> Self {
        Self {
            max_position_notional: default_max_position_notional(),
            max_total_exposure: default_max_total_exposure(),
            max_leverage: default_max_leverage(),
            allowed_symbols: None,
        }
    }
}

impl PositionLimitPolicy {
    /// Check a decision against the limits.
    ///
    /// Buy and Sell project the order's notional on top of current
    /// exposure; both sides are treated as adding exposure since a sell
    /// may open a short. Hold and Close never increase exposure and only
    /// face the symbol allow-list.
    pub fn check(
        &self,
        decision: &Decision,
        snapshot: &PortfolioSnapshot,
    ) -> Result<(), LimitKind> {
        if let Some(allowed) = &self.allowed_symbols {
            if !allowed.contains(&decision.symbol) {
                return Err(LimitKind::SymbolNotAllowed);
            }
        }

        if !decision.action.is_order() {
            return Ok(());
        }

        let mark = snapshot
            .mark(&decision.symbol)
            .ok_or(LimitKind::UnpricedSymbol)?;
        let order_notional = decision.size.notional(mark);

        let projected_symbol = snapshot.symbol_exposure(&decision.symbol) + order_notional;
        if projected_symbol > self.max_position_notional {
            return Err(LimitKind::PositionSize);
        }

        let projected_total = snapshot.total_exposure() + order_notional;
        if projected_total > self.max_total_exposure {
            return Err(LimitKind::TotalExposure);
        }

        if snapshot.equity <= Decimal::ZERO
            || projected_total > snapshot.equity * self.max_leverage
        {
            return Err(LimitKind::Leverage);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{AgentId, Position, Price, Size};

    fn btc() -> Symbol {
        Symbol::new("BTC/USD").unwrap()
    }

    fn decision(action: TradeAction, size: Decimal) -> Decision {
        Decision::new(
            btc(),
            action,
            Size::new(size),
            dec!(0.9),
            AgentId::new("a1"),
        )
    }

    fn snapshot_with_exposure(exposure: Decimal) -> PortfolioSnapshot {
        // One ETH position carrying the given notional at a $1 mark, plus
        // a BTC mark so orders can be valued.
        let eth = Symbol::new("ETH/USD").unwrap();
        let mut snapshot = PortfolioSnapshot::with_equity(dec!(100000));
        snapshot.positions = vec![Position {
            symbol: eth.clone(),
            size: Size::new(exposure),
            entry_price: Price::new(dec!(1)),
            mark_price: Price::new(dec!(1)),
        }];
        snapshot.marks.insert(btc(), Price::new(dec!(1000)));
        snapshot
    }

    #[test]
    fn test_order_within_limits_allowed() {
        let policy = PositionLimitPolicy::default();
        let snapshot = snapshot_with_exposure(dec!(45000));

        // $4K order on $45K exposure = $49K, under the $50K cap.
        let d = decision(TradeAction::Buy, dec!(4));
        assert_eq!(policy.check(&d, &snapshot), Ok(()));
    }

    #[test]
    fn test_total_exposure_breach_denied() {
        let policy = PositionLimitPolicy::default();
        let snapshot = snapshot_with_exposure(dec!(48000));

        // $4K order on $48K exposure = $52K, over the $50K cap.
        let d = decision(TradeAction::Buy, dec!(4));
        assert_eq!(policy.check(&d, &snapshot), Err(LimitKind::TotalExposure));
    }

    #[test]
    fn test_position_size_breach_denied() {
        let policy = PositionLimitPolicy::default();
        let snapshot = snapshot_with_exposure(dec!(0));

        // $11K in one symbol, over the $10K per-symbol cap.
        let d = decision(TradeAction::Buy, dec!(11));
        assert_eq!(policy.check(&d, &snapshot), Err(LimitKind::PositionSize));
    }

    #[test]
    fn test_sell_also_projects_exposure() {
        let policy = PositionLimitPolicy::default();
        let snapshot = snapshot_with_exposure(dec!(48000));

        let d = decision(TradeAction::Sell, dec!(4));
        assert_eq!(policy.check(&d, &snapshot), Err(LimitKind::TotalExposure));
    }

    #[test]
    fn test_leverage_breach_denied() {
        let policy = PositionLimitPolicy {
            max_position_notional: dec!(1000000),
            max_total_exposure: dec!(1000000),
            max_leverage: dec!(2),
            allowed_symbols: None,
        };
        let mut snapshot = snapshot_with_exposure(dec!(0));
        snapshot.equity = dec!(1000);

        // $3K projected on $1K equity = 3x leverage, over the 2x cap.
        let d = decision(TradeAction::Buy, dec!(3));
        assert_eq!(policy.check(&d, &snapshot), Err(LimitKind::Leverage));
    }

    #[test]
    fn test_zero_equity_denied() {
        let policy = PositionLimitPolicy::default();
        let mut snapshot = snapshot_with_exposure(dec!(0));
        snapshot.equity = Decimal::ZERO;

        let d = decision(TradeAction::Buy, dec!(1));
        assert_eq!(policy.check(&d, &snapshot), Err(LimitKind::Leverage));
    }

    #[test]
    fn test_allow_list_applies_to_all_actions() {
        let mut allowed = HashSet::new();
        allowed.insert(Symbol::new("ETH/USD").unwrap());
        let policy = PositionLimitPolicy {
            allowed_symbols: Some(allowed),
            ..Default::default()
        };
        let snapshot = snapshot_with_exposure(dec!(0));

        let buy = decision(TradeAction::Buy, dec!(1));
        assert_eq!(policy.check(&buy, &snapshot), Err(LimitKind::SymbolNotAllowed));

        let close = decision(TradeAction::Close, dec!(0));
        assert_eq!(
            policy.check(&close, &snapshot),
            Err(LimitKind::SymbolNotAllowed)
        );
    }

    #[test]
    fn test_close_skips_sizing_checks() {
        let policy = PositionLimitPolicy::default();
        // Exposure already over every cap; closing must still be allowed.
        let snapshot = snapshot_with_exposure(dec!(500000));

        let d = decision(TradeAction::Close, dec!(0));
        assert_eq!(policy.check(&d, &snapshot), Ok(()));
    }

    #[test]
    fn test_unpriced_symbol_denied() {
        let policy = PositionLimitPolicy::default();
        let snapshot = PortfolioSnapshot::with_equity(dec!(100000));

        let d = decision(TradeAction::Buy, dec!(1));
        assert_eq!(policy.check(&d, &snapshot), Err(LimitKind::UnpricedSymbol));
    }
}
