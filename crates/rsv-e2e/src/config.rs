//! Harness configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HarnessError, HarnessResult};

/// Environment flag selecting the coverage-instrumented external node
pub const COVERAGE_ENV: &str = "COVERAGE_ENABLED";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Run against the external coverage node instead of the simulated ledger
    #[serde(default)]
    pub coverage_enabled: bool,
    /// JSON-RPC endpoint of the external node
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Where the coverage profile is written on teardown
    #[serde(default = "default_coverage_profile")]
    pub coverage_profile: PathBuf,
    /// Report generator run after the profile is written
    #[serde(default = "default_report_command")]
    pub report_command: Vec<String>,
    /// Instrumentation proxy started in front of the node, if any
    #[serde(default)]
    pub proxy_command: Option<Vec<String>>,
    /// Receipt polling interval against an external node
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Simulated block gas limit
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,
    /// Simulated chain id
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_coverage_profile() -> PathBuf {
    PathBuf::from("coverage/coverage.json")
}

fn default_report_command() -> Vec<String> {
    ["npx", "istanbul", "report", "html"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_block_gas_limit() -> u64 {
    rsv_core::DEFAULT_BLOCK_GAS_LIMIT
}

fn default_chain_id() -> u64 {
    rsv_core::DEFAULT_CHAIN_ID
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            coverage_enabled: false,
            rpc_url: default_rpc_url(),
            coverage_profile: default_coverage_profile(),
            report_command: default_report_command(),
            proxy_command: None,
            poll_interval_ms: default_poll_interval_ms(),
            block_gas_limit: default_block_gas_limit(),
            chain_id: default_chain_id(),
        }
    }
}

impl HarnessConfig {
    /// Defaults, with coverage mode taken from `COVERAGE_ENABLED`.
    ///
    /// Any non-empty value enables it.
    pub fn from_env() -> Self {
        let flag = std::env::var(COVERAGE_ENV).unwrap_or_default();
        Self::default().with_coverage_flag(&flag)
    }

    fn with_coverage_flag(mut self, flag: &str) -> Self {
        self.coverage_enabled = !flag.is_empty();
        self
    }

    /// Read a TOML file
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Receipt polling interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
