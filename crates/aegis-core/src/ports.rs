//! Capability ports injected into the safety and execution layers.
//!
//! The core logic is polymorphic only over these narrow interfaces;
//! concrete exchange and portfolio plumbing lives outside this workspace.

use crate::decision::Symbol;
use crate::execution::{CloseReport, OrderReceipt, OrderRequest};
use crate::portfolio::PortfolioSnapshot;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the exchange collaborator.
///
/// The transient/permanent split drives the coordinator's retry policy:
/// transient failures are retried with backoff, permanent failures are
/// surfaced immediately and feed the consecutive-failure counter.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// Network error or timeout; safe to retry.
    #[error("transient exchange failure: {0}")]
    Transient(String),

    /// Exchange rejected the order parameters.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Not enough balance to place the order.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
}

impl ExchangeError {
    /// Whether the coordinator may retry after this error.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Exchange order entry, the only outbound trading surface.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Submit an order for execution.
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderReceipt, ExchangeError>;

    /// Close the full open position in a symbol at market.
    async fn close_position(&self, symbol: &Symbol) -> Result<CloseReport, ExchangeError>;
}

/// Source of current portfolio snapshots for authorization checks.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn snapshot(&self) -> Result<PortfolioSnapshot, ExchangeError>;
}
