//! Exchange dispatch wrapper: timeouts and order mapping.

use aegis_core::{
    CloseReport, Decision, ExchangeClient, ExchangeError, OrderKind, OrderReceipt, OrderRequest,
    OrderSide, Symbol, TradeAction,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Wraps the raw exchange client with a per-call timeout.
///
/// A timed-out call maps to `ExchangeError::Transient` so the retry
/// policy treats it like any other transient fault.
pub struct DispatchClient {
    inner: Arc<dyn ExchangeClient>,
    timeout: Duration,
}

impl DispatchClient {
    #[must_use]
    pub fn new(inner: Arc<dyn ExchangeClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub async fn submit_order(&self, request: OrderRequest) -> Result<OrderReceipt, ExchangeError> {
        match tokio::time::timeout(self.timeout, self.inner.submit_order(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Order dispatch timed out");
                Err(ExchangeError::Transient("dispatch timeout".to_string()))
            }
        }
    }

    pub async fn close_position(&self, symbol: &Symbol) -> Result<CloseReport, ExchangeError> {
        match tokio::time::timeout(self.timeout, self.inner.close_position(symbol)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(symbol = %symbol, "Close dispatch timed out");
                Err(ExchangeError::Transient("dispatch timeout".to_string()))
            }
        }
    }
}

/// Map a Buy/Sell decision onto a market order request.
///
/// Hold and Close never become order requests; they resolve through
/// their own paths in the coordinator.
#[must_use]
pub fn order_request(decision: &Decision) -> Option<OrderRequest> {
    let side = match decision.action {
        TradeAction::Buy => OrderSide::Buy,
        TradeAction::Sell => OrderSide::Sell,
        TradeAction::Hold | TradeAction::Close => return None,
    };
    Some(OrderRequest {
        symbol: decision.symbol.clone(),
        side,
        kind: OrderKind::Market,
        quantity: decision.size,
    })
}
