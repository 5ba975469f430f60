//! Pipeline node binary.
//!
//! Wires the safety guard, signing authority, audit ledger and execution
//! coordinator around an in-process paper venue, then consumes decisions
//! as JSON lines from stdin until EOF or Ctrl-C.

mod config;
mod logging;
mod paper;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};

use aegis_core::{Actor, Decision, ExchangeClient, PortfolioSource, Role, Symbol};
use aegis_executor::{CoordinatorConfig, ExecutionCoordinator, Proposal};
use aegis_ledger::AuditLedger;
use aegis_persistence::{EventJournal, StateStore};
use aegis_safety::{run_safety_monitor, SafetyGuard};
use aegis_signing::SigningAuthority;

use crate::config::NodeConfig;
use crate::paper::PaperExchange;

#[derive(Debug, Parser)]
#[command(name = "aegis-node", about = "Trade authorization and execution pipeline node")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let config = if Path::new(&args.config).exists() {
        NodeConfig::from_file(Path::new(&args.config))?
    } else {
        warn!(path = %args.config, "Config file not found, using defaults");
        NodeConfig::default()
    };
    info!(
        data_dir = %config.data_dir.display(),
        owner = %config.owner_id,
        "Starting aegis-node"
    );

    let venue = Arc::new(PaperExchange::new(config.starting_equity));
    for (symbol, price) in &config.marks {
        let symbol = Symbol::new(symbol)
            .with_context(|| format!("invalid symbol in [marks]: {symbol}"))?;
        venue.set_mark(symbol, aegis_core::Price::new(*price));
    }

    let guard = Arc::new(
        SafetyGuard::new(config.safety.clone())
            .with_exchange(venue.clone() as Arc<dyn ExchangeClient>)
            .with_portfolio(venue.clone() as Arc<dyn PortfolioSource>)
            .with_persistence(
                StateStore::new(config.data_dir.join("safety_state.json"))?,
                EventJournal::open(config.data_dir.join("safety_events.jsonl"))?,
            )?,
    );

    let owner = Actor::new(config.owner_id.clone(), Role::Owner);
    let ledger = Arc::new(
        AuditLedger::new(&owner)?
            .with_journal(EventJournal::open(config.data_dir.join("ledger_events.jsonl"))?),
    );

    // Session key: generated at startup, never persisted.
    let authority = SigningAuthority::generate();
    info!(public_key = %authority.public_key(), "Session signing key ready");

    let coordinator = ExecutionCoordinator::new(
        guard.clone(),
        authority,
        ledger.clone(),
        venue.clone() as Arc<dyn ExchangeClient>,
        venue as Arc<dyn PortfolioSource>,
        config.coordinator.clone(),
        config.owner_id.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = tokio::spawn(run_safety_monitor(guard.clone(), shutdown_rx));

    run_decision_loop(&coordinator).await?;

    let _ = shutdown_tx.send(true);
    let _ = monitor.await;
    info!(recorded = ledger.len(), "Shutdown complete");
    Ok(())
}

/// Read one JSON decision per line from stdin and run each through the
/// full propose/submit path.
async fn run_decision_loop(coordinator: &ExecutionCoordinator) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Decision>(&line) {
                    Ok(decision) => handle_decision(coordinator, decision).await,
                    Err(error) => warn!(%error, "Skipping malformed decision line"),
                }
            }
        }
    }
    Ok(())
}

async fn handle_decision(coordinator: &ExecutionCoordinator, decision: Decision) {
    let decision_id = decision.id;
    match coordinator.propose(&decision).await {
        Ok(Proposal::Signed(order)) => match coordinator.submit(&order).await {
            Ok(outcome) => {
                info!(%decision_id, code = %outcome.code(), "Decision resolved");
            }
            Err(error) => error!(%decision_id, %error, "Submission failed"),
        },
        Ok(Proposal::Denied(reason)) => {
            warn!(%decision_id, reason = ?reason, "Decision denied");
        }
        Err(error) => warn!(%decision_id, %error, "Decision rejected"),
    }
}
