//! In-process paper venue for dry runs.
//!
//! Fills every market order at the configured mark price and tracks
//! positions and equity in memory. Serves as both the exchange and the
//! portfolio source, so the full pipeline runs without any external
//! connectivity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use tracing::{debug, info};

use aegis_core::{
    CloseReport, ExchangeClient, ExchangeError, OrderKind, OrderReceipt, OrderRequest, OrderSide,
    PortfolioSnapshot, PortfolioSource, Position, Price, Size, Symbol,
};

pub struct PaperExchange {
    equity: RwLock<Decimal>,
    positions: RwLock<HashMap<Symbol, Position>>,
    marks: RwLock<HashMap<Symbol, Price>>,
    order_seq: AtomicU64,
}

impl PaperExchange {
    #[must_use]
    pub fn new(starting_equity: Decimal) -> Self {
        Self {
            equity: RwLock::new(starting_equity),
            positions: RwLock::new(HashMap::new()),
            marks: RwLock::new(HashMap::new()),
            order_seq: AtomicU64::new(1),
        }
    }

    /// Set or update the mark price for a symbol.
    pub fn set_mark(&self, symbol: Symbol, price: Price) {
        let mut positions = self.positions.write();
        if let Some(position) = positions.get_mut(&symbol) {
            position.mark_price = price;
        }
        self.marks.write().insert(symbol, price);
    }

    fn mark(&self, symbol: &Symbol) -> Option<Price> {
        self.marks.read().get(symbol).copied()
    }

    fn apply_fill(&self, symbol: &Symbol, delta: Decimal, fill: Price) {
        let mut positions = self.positions.write();
        match positions.get_mut(symbol) {
            Some(position) => {
                let old = position.size.inner();
                let new = old + delta;
                if new.is_zero() {
                    positions.remove(symbol);
                    return;
                }
                // Adds in the same direction blend the entry; reduces and
                // flips keep it simple and re-enter at the fill price.
                if old.signum() == new.signum() && old.abs() < new.abs() {
                    let blended = (position.entry_price.inner() * old.abs()
                        + fill.inner() * delta.abs())
                        / new.abs();
                    position.entry_price = Price::new(blended);
                } else if old.signum() != new.signum() {
                    position.entry_price = fill;
                }
                position.size = Size::new(new);
                position.mark_price = fill;
            }
            None => {
                positions.insert(
                    symbol.clone(),
                    Position {
                        symbol: symbol.clone(),
                        size: Size::new(delta),
                        entry_price: fill,
                        mark_price: fill,
                    },
                );
            }
        }
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderReceipt, ExchangeError> {
        let mark = self.mark(&request.symbol).ok_or_else(|| {
            ExchangeError::Rejected(format!("no mark price for {}", request.symbol))
        })?;
        let fill = match request.kind {
            OrderKind::Market => mark,
            OrderKind::Limit { price } => price,
        };

        let quantity = request.quantity.inner().abs();
        let delta = match request.side {
            OrderSide::Buy => quantity,
            OrderSide::Sell => -quantity,
        };
        self.apply_fill(&request.symbol, delta, fill);

        let order_id = format!("paper-{}", self.order_seq.fetch_add(1, Ordering::Relaxed));
        debug!(
            order_id,
            symbol = %request.symbol,
            quantity = %quantity,
            fill = %fill.inner(),
            "Paper fill"
        );
        Ok(OrderReceipt {
            order_id,
            filled_quantity: Size::new(quantity),
            fill_price: fill,
        })
    }

    async fn close_position(&self, symbol: &Symbol) -> Result<CloseReport, ExchangeError> {
        let position = self
            .positions
            .write()
            .remove(symbol)
            .ok_or_else(|| ExchangeError::Rejected(format!("no open position in {symbol}")))?;

        let mark = self.mark(symbol).unwrap_or(position.mark_price);
        let realized_pnl =
            (mark.inner() - position.entry_price.inner()) * position.size.inner();
        *self.equity.write() += realized_pnl;

        info!(
            symbol = %symbol,
            quantity = %position.size.inner(),
            pnl = %realized_pnl,
            "Paper position closed"
        );
        Ok(CloseReport {
            symbol: symbol.clone(),
            closed_quantity: Size::new(position.size.inner().abs()),
            realized_pnl,
        })
    }
}

#[async_trait]
impl PortfolioSource for PaperExchange {
    async fn snapshot(&self) -> Result<PortfolioSnapshot, ExchangeError> {
        Ok(PortfolioSnapshot {
            equity: *self.equity.read(),
            positions: self.positions.read().values().cloned().collect(),
            marks: self.marks.read().clone(),
            taken_at: Utc::now(),
        })
    }
}
