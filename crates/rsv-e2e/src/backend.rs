//! Node abstraction
//!
//! [`Backend`] is what bindings and the suite talk to. Three variants:
//!
//! - [`SimulatedBackend`]: the in-process [`Ledger`], mined on every send,
//!   with a [`Clock`] for time travel
//! - [`RpcBackend`]: any JSON-RPC node
//! - [`CoverageBackend`]: an instrumented node that can dump a coverage
//!   profile and owns the instrumentation proxy process

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rsv_core::{Ledger, LedgerConfig, GAS_ESTIMATION_FAILED};
use rsv_primitives::{Address, H256};
use rsv_sdk::types::{BlockId, CallRequest};
use rsv_sdk::{RpcClient, SdkError};
use rsv_types::{Receipt, SignedTransaction};
use tokio::process::{Child, Command};
use tracing::{debug, trace};

use crate::{HarnessConfig, HarnessError, HarnessResult};

/// Vendor method returning the instrumented node's coverage profile
pub const COVERAGE_METHOD: &str = "coverage_getProfile";

/// Gas price the simulated ledger suggests
const SIMULATED_GAS_PRICE: u128 = 1;

/// Ledger access needed by the harness (object-safe)
#[async_trait]
pub trait Backend: Send + Sync {
    /// Chain id used for replay protection
    async fn chain_id(&self) -> HarnessResult<u64>;

    /// Next nonce for `address`, counting pending transactions
    async fn pending_nonce(&self, address: &Address) -> HarnessResult<u64>;

    /// Suggested gas price
    async fn gas_price(&self) -> HarnessResult<u128>;

    /// Gas needed by `request`. Fails with [`HarnessError::GasEstimation`]
    /// when the dry run fails at any gas limit.
    async fn estimate_gas(&self, request: &CallRequest) -> HarnessResult<u64>;

    /// Read-only call against the latest state
    async fn call(&self, request: &CallRequest) -> HarnessResult<Bytes>;

    /// Submit a signed transaction
    async fn send_transaction(&self, tx: &SignedTransaction) -> HarnessResult<H256>;

    /// Receipt of a mined transaction, `None` while pending
    async fn receipt(&self, hash: &H256) -> HarnessResult<Option<Receipt>>;

    /// Delay between receipt polls
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// Time travel, when the backend supports it
    fn clock(&self) -> Option<&dyn Clock> {
        None
    }
}

/// Control over the ledger clock
pub trait Clock: Send + Sync {
    /// Move time forward by `delta` and mine a block at the new time
    fn adjust_time(&self, delta: Duration) -> HarnessResult<()>;
}

/// Poll until `hash` is mined. There is no timeout: a node that never mines
/// the transaction blocks the caller.
pub async fn wait_mined(backend: &dyn Backend, hash: &H256) -> HarnessResult<Receipt> {
    loop {
        if let Some(receipt) = backend.receipt(hash).await? {
            return Ok(receipt);
        }
        trace!(tx = %hash, "transaction not yet mined");
        tokio::time::sleep(backend.poll_interval()).await;
    }
}

// ==================== Simulated ====================

/// In-process ledger that mines every transaction as it arrives
pub struct SimulatedBackend {
    ledger: Mutex<Ledger>,
}

impl SimulatedBackend {
    /// Wrap a ledger built from `config`
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new(config)),
        }
    }

    /// Ledger with `accounts` funded at genesis, sized by the harness config
    pub fn funded(config: &HarnessConfig, accounts: impl IntoIterator<Item = Address>) -> Self {
        let ledger_config = LedgerConfig {
            chain_id: config.chain_id,
            block_gas_limit: config.block_gas_limit,
            ..LedgerConfig::default()
        }
        .with_accounts(accounts);
        Self::new(ledger_config)
    }

    /// Inspect the ledger directly
    pub fn with_ledger<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.ledger.lock())
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    async fn chain_id(&self) -> HarnessResult<u64> {
        Ok(self.ledger.lock().chain_id())
    }

    async fn pending_nonce(&self, address: &Address) -> HarnessResult<u64> {
        Ok(self.ledger.lock().nonce(address))
    }

    async fn gas_price(&self) -> HarnessResult<u128> {
        Ok(SIMULATED_GAS_PRICE)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> HarnessResult<u64> {
        Ok(self.ledger.lock().estimate_gas(request)?)
    }

    async fn call(&self, request: &CallRequest) -> HarnessResult<Bytes> {
        Ok(Bytes::from(self.ledger.lock().call(request)?))
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> HarnessResult<H256> {
        Ok(self.ledger.lock().send_transaction(tx.clone())?)
    }

    async fn receipt(&self, hash: &H256) -> HarnessResult<Option<Receipt>> {
        Ok(self.ledger.lock().receipt(hash).cloned())
    }

    fn poll_interval(&self) -> Duration {
        Duration::ZERO
    }

    fn clock(&self) -> Option<&dyn Clock> {
        Some(self)
    }
}

impl Clock for SimulatedBackend {
    fn adjust_time(&self, delta: Duration) -> HarnessResult<()> {
        self.ledger.lock().adjust_time(delta.as_secs());
        Ok(())
    }
}

// ==================== JSON-RPC ====================

fn map_estimate_error(e: SdkError) -> HarnessError {
    match e {
        SdkError::Rpc { ref message, .. } if message.contains("always failing transaction") => {
            HarnessError::GasEstimation(GAS_ESTIMATION_FAILED.to_string())
        }
        other => HarnessError::Rpc(other),
    }
}

/// Node reached over JSON-RPC
#[derive(Clone)]
pub struct RpcBackend {
    client: RpcClient,
    poll_interval: Duration,
}

impl RpcBackend {
    /// Backend over HTTP
    pub fn http(url: &str, poll_interval: Duration) -> Self {
        Self::with_client(RpcClient::http(url), poll_interval)
    }

    /// Backend over an existing client
    pub fn with_client(client: RpcClient, poll_interval: Duration) -> Self {
        Self { client, poll_interval }
    }

    /// Underlying client, for vendor methods
    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl Backend for RpcBackend {
    async fn chain_id(&self) -> HarnessResult<u64> {
        Ok(self.client.chain_id().await?)
    }

    async fn pending_nonce(&self, address: &Address) -> HarnessResult<u64> {
        Ok(self.client.get_nonce(address, BlockId::Pending).await?)
    }

    async fn gas_price(&self) -> HarnessResult<u128> {
        Ok(self.client.gas_price().await?)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> HarnessResult<u64> {
        self.client.estimate_gas(request).await.map_err(map_estimate_error)
    }

    async fn call(&self, request: &CallRequest) -> HarnessResult<Bytes> {
        Ok(self.client.call(request, BlockId::Latest).await?)
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> HarnessResult<H256> {
        Ok(self.client.send_transaction(tx).await?)
    }

    async fn receipt(&self, hash: &H256) -> HarnessResult<Option<Receipt>> {
        Ok(self.client.get_receipt(hash).await?)
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

// ==================== Coverage ====================

/// Coverage-instrumented external node
pub struct CoverageBackend {
    rpc: RpcBackend,
    profile_path: PathBuf,
    proxy: Mutex<Option<Child>>,
}

impl CoverageBackend {
    /// Wrap `rpc`, writing the profile to `profile_path`
    pub fn new(rpc: RpcBackend, profile_path: impl Into<PathBuf>) -> Self {
        Self {
            rpc,
            profile_path: profile_path.into(),
            proxy: Mutex::new(None),
        }
    }

    /// Start the configured proxy, if any, and connect to `config.rpc_url`
    pub fn connect(config: &HarnessConfig) -> HarnessResult<Self> {
        let backend = Self::new(
            RpcBackend::http(&config.rpc_url, config.poll_interval()),
            config.coverage_profile.clone(),
        );
        if let Some(command) = &config.proxy_command {
            let (program, args) = command
                .split_first()
                .ok_or_else(|| HarnessError::Config("empty proxy_command".into()))?;
            let child = Command::new(program).args(args).kill_on_drop(true).spawn()?;
            debug!(program = %program, pid = ?child.id(), "started coverage proxy");
            *backend.proxy.lock() = Some(child);
        }
        Ok(backend)
    }

    /// Where [`write_coverage`](Self::write_coverage) puts the profile
    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    /// Fetch the coverage profile from the node and write it to disk
    pub async fn write_coverage(&self) -> HarnessResult<PathBuf> {
        let profile: serde_json::Value = self.rpc.client().request(COVERAGE_METHOD, vec![]).await?;
        if let Some(parent) = self.profile_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_vec_pretty(&profile)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.profile_path, content)?;
        debug!(path = %self.profile_path.display(), "wrote coverage profile");
        Ok(self.profile_path.clone())
    }

    /// Stop the proxy process, if one was started
    pub async fn close(&self) -> HarnessResult<()> {
        let child = self.proxy.lock().take();
        if let Some(mut child) = child {
            child.kill().await?;
            debug!("stopped coverage proxy");
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for CoverageBackend {
    async fn chain_id(&self) -> HarnessResult<u64> {
        self.rpc.chain_id().await
    }

    async fn pending_nonce(&self, address: &Address) -> HarnessResult<u64> {
        self.rpc.pending_nonce(address).await
    }

    async fn gas_price(&self) -> HarnessResult<u128> {
        self.rpc.gas_price().await
    }

    async fn estimate_gas(&self, request: &CallRequest) -> HarnessResult<u64> {
        self.rpc.estimate_gas(request).await
    }

    async fn call(&self, request: &CallRequest) -> HarnessResult<Bytes> {
        self.rpc.call(request).await
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> HarnessResult<H256> {
        self.rpc.send_transaction(tx).await
    }

    async fn receipt(&self, hash: &H256) -> HarnessResult<Option<Receipt>> {
        self.rpc.receipt(hash).await
    }

    fn poll_interval(&self) -> Duration {
        self.rpc.poll_interval()
    }
}
