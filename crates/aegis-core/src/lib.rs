//! Core domain types for the aegis trade-authorization pipeline.
//!
//! This crate provides the fundamental types shared by every stage of the
//! pipeline:
//! - `Decision`: a proposed trading action awaiting authorization
//! - `Price`, `Size`: precision-safe numeric types
//! - `PortfolioSnapshot`: point-in-time view of open positions and equity
//! - `Authorization` / `DenyReason`: machine-readable gate verdicts
//! - `ExecutionOutcome`: the resolved result of a submission
//! - Capability ports (`ExchangeClient`, `PortfolioSource`) injected into
//!   the safety and execution layers

pub mod actor;
pub mod decimal;
pub mod decision;
pub mod error;
pub mod execution;
pub mod portfolio;
pub mod ports;

pub use actor::{Actor, Role};
pub use decimal::{Price, Size};
pub use decision::{AgentId, Decision, Symbol, TradeAction};
pub use error::{CoreError, Result};
pub use portfolio::{PortfolioSnapshot, Position};

// Execution types
pub use execution::{
    Authorization, CloseReport, DenyReason, ExecutionOutcome, FailureCode, FailureDetail,
    LimitKind, OrderKind, OrderReceipt, OrderRequest, OrderSide, SkipReason,
};

// Capability ports
pub use ports::{ExchangeClient, ExchangeError, PortfolioSource};
