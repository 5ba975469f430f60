//! Node configuration loaded from a TOML file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aegis_executor::CoordinatorConfig;
use aegis_safety::SafetyConfig;

/// Top-level node configuration. Every field has a default, so an
/// empty file (or no file at all) yields a runnable paper setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory for durable state and event journals.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Ledger owner identity; also the submitter the node records under.
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
    /// Starting equity for the paper venue, in USD.
    #[serde(default = "default_starting_equity")]
    pub starting_equity: Decimal,
    /// Initial mark prices for the paper venue, keyed by symbol.
    #[serde(default)]
    pub marks: HashMap<String, Decimal>,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_owner_id() -> String {
    "owner".to_string()
}

fn default_starting_equity() -> Decimal {
    Decimal::new(100_000, 0)
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            owner_id: default_owner_id(),
            starting_equity: default_starting_equity(),
            marks: HashMap::new(),
            safety: SafetyConfig::default(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}
