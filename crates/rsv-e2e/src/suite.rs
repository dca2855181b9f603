//! Test suite: node, accounts, fresh deployment and transaction assertions

use std::sync::Arc;

use bytes::Bytes;
use rsv_contracts::{Event, ReserveEvent};
use rsv_primitives::{Address, U256};
use rsv_types::{LegacyTx, Receipt, SignedTransaction, TxStatus};
use tokio::process::Command;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::bindings::ESTIMATION_FAILURE;
use crate::{
    check_at_least_events, check_strict_events, wait_mined, Backend, BindingResult, Clock, CoverageBackend,
    HarnessConfig, HarnessError, HarnessResult, LogParser, LogParserRegistry, Reserve, ReserveEternalStorage,
    SimulatedBackend, TestAccount, TimeUtil, TransactOpts,
};

/// Install the `RUST_LOG`-filtered subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}

/// Shared node, test accounts and a freshly deployed Reserve.
///
/// Every assertion method panics on mismatch, failing the calling test.
pub struct TestSuite {
    config: HarnessConfig,
    accounts: Vec<TestAccount>,
    backend: Arc<dyn Backend>,
    coverage: Option<Arc<CoverageBackend>>,
    registry: LogParserRegistry,
    time_util: TimeUtil,
    /// Token under test
    pub reserve: Reserve,
    /// Address of `reserve`
    pub reserve_address: Address,
    /// Storage owned by `reserve`
    pub eternal_storage: ReserveEternalStorage,
    /// Address of `eternal_storage`
    pub eternal_storage_address: Address,
}

impl TestSuite {
    /// Connect to the node selected by `config`, deploy the time utility and
    /// a fresh Reserve, and hand account 0 the minter, pauser and freezer roles.
    ///
    /// The node chosen here serves the whole run; scenarios get a fresh
    /// deployment from [`before_test`](Self::before_test).
    pub async fn setup(config: HarnessConfig) -> HarnessResult<Self> {
        init_tracing();
        let accounts = TestAccount::all()?;

        let (backend, coverage): (Arc<dyn Backend>, Option<Arc<CoverageBackend>>) = if config.coverage_enabled {
            eprintln!("\nA local geth node must be running for coverage to work.");
            eprintln!("If one is not already running, start one in a new terminal with:");
            eprintln!("\n\tmake run-geth");

            let node = Arc::new(CoverageBackend::connect(&config)?);
            prime_chain(node.as_ref(), &accounts[0]).await?;
            (node.clone(), Some(node))
        } else {
            let node = SimulatedBackend::funded(&config, accounts.iter().map(TestAccount::address));
            (Arc::new(node), None)
        };

        let signer = accounts[0].signer();
        let (_, tx, time_util) = TimeUtil::deploy(&signer, backend.clone()).await.map_err(setup_error)?;
        let receipt = mined_successfully(backend.as_ref(), &tx).await?;
        if !receipt.logs.is_empty() {
            return Err(HarnessError::Setup("time utility deployment emitted events".into()));
        }

        let (reserve, eternal_storage) = deploy_reserve(&backend, &signer).await?;
        let mut suite = Self {
            config,
            accounts,
            backend,
            coverage,
            registry: LogParserRegistry::new(),
            time_util,
            reserve_address: reserve.address(),
            eternal_storage_address: eternal_storage.address(),
            reserve,
            eternal_storage,
        };
        suite.reset_registry();
        suite.grant_roles().await;
        info!(reserve = %suite.reserve_address, coverage = suite.coverage.is_some(), "suite ready");
        Ok(suite)
    }

    /// Redeploy Reserve and its storage, reset the parsers and grant roles again
    pub async fn before_test(&mut self) -> HarnessResult<()> {
        let signer = self.signer();
        let (reserve, eternal_storage) = deploy_reserve(&self.backend, &signer).await?;
        self.reserve_address = reserve.address();
        self.eternal_storage_address = eternal_storage.address();
        self.reserve = reserve;
        self.eternal_storage = eternal_storage;
        self.reset_registry();
        self.grant_roles().await;
        Ok(())
    }

    fn reset_registry(&mut self) {
        self.registry.clear();
        self.registry.register(self.reserve_address, self.reserve.clone());
        self.registry.register(self.eternal_storage_address, self.eternal_storage.clone());
    }

    async fn grant_roles(&self) {
        let signer = self.signer();
        let deployer = self.account(0);

        self.require_tx(self.reserve.change_minter(&signer, deployer).await)
            .await
            .with_events([ReserveEvent::MinterChanged { new_minter: deployer }]);
        self.require_tx(self.reserve.change_pauser(&signer, deployer).await)
            .await
            .with_events([ReserveEvent::PauserChanged { new_pauser: deployer }]);
        self.require_tx(self.reserve.change_freezer(&signer, deployer).await)
            .await
            .with_events([ReserveEvent::FreezerChanged { new_freezer: deployer }]);
    }

    /// Write the coverage profile, stop the proxy and render the report.
    ///
    /// Called once per run, after the last scenario. A failing report
    /// generator is reported, not returned.
    pub async fn teardown(self) -> HarnessResult<()> {
        let Some(coverage) = self.coverage else {
            return Ok(());
        };
        let profile = coverage.write_coverage().await?;
        coverage.close().await?;

        let Some((program, args)) = self.config.report_command.split_first() else {
            return Ok(());
        };
        let failure = match Command::new(program).args(args).output().await {
            Ok(output) if output.status.success() => None,
            Ok(output) => Some((
                output.status.to_string(),
                format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                ),
            )),
            Err(e) => Some((e.to_string(), String::new())),
        };
        if let Some((error, output)) = failure {
            eprintln!();
            eprintln!("I generated coverage information in {}.", profile.display());
            eprintln!("I tried to process it with `{}` to turn it into a readable report, but failed.", program);
            eprintln!("The error I got when running {} was: {}", program, error);
            eprintln!("Its output was:\n{}", output);
            warn!(program = %program, %error, "coverage report generation failed");
        }
        Ok(())
    }

    // ==================== Accessors ====================

    /// Address of test account `i`
    pub fn account(&self, i: usize) -> Address {
        self.accounts[i].address()
    }

    /// Transaction options for test account `i`
    pub fn signer_for(&self, i: usize) -> TransactOpts {
        self.accounts[i].signer()
    }

    /// Transaction options for the deploying account
    pub fn signer(&self) -> TransactOpts {
        self.signer_for(0)
    }

    /// Node the suite runs against
    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    /// Time travel, absent in coverage mode
    pub fn clock(&self) -> Option<&dyn Clock> {
        self.backend.clock()
    }

    /// Decode future logs from `address` with `parser`
    pub fn register(&mut self, address: Address, parser: impl LogParser + 'static) {
        self.registry.register(address, parser);
    }

    // ==================== Transactions ====================

    /// The transaction was submitted, mined and succeeded.
    ///
    /// The returned handle checks that the receipt contains at least a
    /// given set of events.
    pub async fn require_tx(&self, result: BindingResult<SignedTransaction>) -> AtLeastEvents<'_> {
        AtLeastEvents {
            registry: &self.registry,
            receipt: self.require_status(result, TxStatus::Success).await,
        }
    }

    /// Like [`require_tx`](Self::require_tx), but the returned handle checks
    /// the receipt's events exactly and in order
    pub async fn require_tx_with_strict_events(&self, result: BindingResult<SignedTransaction>) -> StrictEvents<'_> {
        StrictEvents {
            registry: &self.registry,
            receipt: self.require_status(result, TxStatus::Success).await,
        }
    }

    /// The transaction was refused by gas estimation, or was mined with a
    /// failed status and no logs
    pub async fn require_tx_fails(&self, result: BindingResult<SignedTransaction>) {
        if let Err(e) = &result {
            if e.to_string() == ESTIMATION_FAILURE {
                debug!("transaction rejected by gas estimation");
                return;
            }
        }
        let receipt = self.require_status(result, TxStatus::Failure).await;
        assert_eq!(
            receipt.logs.len(),
            0,
            "Zero logs should be generated for a failed transaction"
        );
    }

    async fn require_status(&self, result: BindingResult<SignedTransaction>, status: TxStatus) -> Receipt {
        let tx = match result {
            Ok(tx) => tx,
            Err(e) => panic!("transaction was not sent: {}", e),
        };
        let receipt = match wait_mined(self.backend.as_ref(), &tx.hash()).await {
            Ok(receipt) => receipt,
            Err(e) => panic!("waiting for {} to be mined: {}", tx.hash(), e),
        };
        assert_eq!(
            receipt.status,
            status,
            "unexpected status for transaction {}",
            tx.hash()
        );
        receipt
    }

    // ==================== Ledger views ====================

    /// Reserve balance of `address` is `amount`
    pub async fn assert_balance(&self, address: Address, amount: U256) {
        let balance = self.reserve.balance_of(address).await;
        let balance = balance.unwrap_or_else(|e| panic!("balanceOf({}): {}", address, e));
        assert_eq!(amount.to_string(), balance.to_string(), "balance of {}", address);
    }

    /// Allowance `holder` gave `spender` is `amount`
    pub async fn assert_allowance(&self, holder: Address, spender: Address, amount: U256) {
        let allowance = self.reserve.allowance(holder, spender).await;
        let allowance = allowance.unwrap_or_else(|e| panic!("allowance({}, {}): {}", holder, spender, e));
        assert_eq!(
            amount.to_string(),
            allowance.to_string(),
            "allowance of {} for {}",
            holder,
            spender
        );
    }

    /// Reserve total supply is `amount`
    pub async fn assert_total_supply(&self, amount: U256) {
        let supply = self.reserve.total_supply().await;
        let supply = supply.unwrap_or_else(|e| panic!("totalSupply(): {}", e));
        assert_eq!(amount.to_string(), supply.to_string(), "total supply");
    }

    /// Timestamp of the latest block, read through the time utility
    pub async fn current_timestamp(&self) -> U256 {
        match self.time_util.time().await {
            Ok(time) => time,
            Err(e) => panic!("reading block time: {}", e),
        }
    }
}

/// Successful receipt awaiting an at-least event check
#[derive(Debug)]
pub struct AtLeastEvents<'a> {
    registry: &'a LogParserRegistry,
    receipt: Receipt,
}

impl AtLeastEvents<'_> {
    /// Every event in `expected` was emitted, in any order
    pub fn with_events<E: Into<Event>>(self, expected: impl IntoIterator<Item = E>) -> Receipt {
        let expected: Vec<Event> = expected.into_iter().map(Into::into).collect();
        if let Err(e) = check_at_least_events(self.registry, &self.receipt.logs, &expected) {
            panic!("{}", e);
        }
        self.receipt
    }

    /// The mined receipt
    pub fn receipt(self) -> Receipt {
        self.receipt
    }
}

/// Successful receipt awaiting an exact event check
#[derive(Debug)]
pub struct StrictEvents<'a> {
    registry: &'a LogParserRegistry,
    receipt: Receipt,
}

impl StrictEvents<'_> {
    /// Exactly `expected` was emitted, in this order
    pub fn with_events<E: Into<Event>>(self, expected: impl IntoIterator<Item = E>) -> Receipt {
        let expected: Vec<Event> = expected.into_iter().map(Into::into).collect();
        if let Err(e) = check_strict_events(self.registry, &self.receipt.logs, &expected) {
            panic!("{}", e);
        }
        self.receipt
    }

    /// Nothing was emitted
    pub fn with_no_events(self) -> Receipt {
        self.with_events(Vec::<Event>::new())
    }

    /// The mined receipt
    pub fn receipt(self) -> Receipt {
        self.receipt
    }
}

fn setup_error(e: impl std::fmt::Display) -> HarnessError {
    HarnessError::Setup(e.to_string())
}

async fn mined_successfully(backend: &dyn Backend, tx: &SignedTransaction) -> HarnessResult<Receipt> {
    let receipt = wait_mined(backend, &tx.hash()).await?;
    if receipt.status != TxStatus::Success {
        return Err(HarnessError::Setup(format!("transaction {} failed", tx.hash())));
    }
    Ok(receipt)
}

async fn deploy_reserve(
    backend: &Arc<dyn Backend>,
    signer: &TransactOpts,
) -> HarnessResult<(Reserve, ReserveEternalStorage)> {
    let (address, tx, reserve) = Reserve::deploy(signer, backend.clone()).await.map_err(setup_error)?;
    mined_successfully(backend.as_ref(), &tx).await?;

    let storage_address = reserve.get_eternal_storage_address().await.map_err(setup_error)?;
    debug!(reserve = %address, eternal_storage = %storage_address, "deployed reserve");
    Ok((reserve, ReserveEternalStorage::at(storage_address, backend.clone())))
}

/// Throwaway unprotected transfer that moves a fresh instrumented chain past
/// its early hard-fork blocks. Rejection is expected on any other chain.
async fn prime_chain(backend: &dyn Backend, account: &TestAccount) -> HarnessResult<()> {
    let mut to = [0u8; 20];
    to[0] = 100;
    let tx = LegacyTx {
        nonce: 0,
        gas_price: 1,
        gas_limit: 21_000,
        to: Some(Address::from_bytes(to)),
        value: 0,
        data: Bytes::new(),
    }
    .sign(account.key(), None)?;
    if let Err(e) = backend.send_transaction(&tx).await {
        debug!(error = %e, "priming transaction rejected");
    }
    Ok(())
}

// ==================== Value helpers ====================

/// 2^256 - 1
pub fn max_uint256() -> U256 {
    U256::MAX
}

/// 2^160 - 1
pub fn max_uint160() -> U256 {
    (U256::one() << 160) - U256::one()
}

/// 2^159, the bit pattern of the most negative int160
pub fn min_int160_as_uint160() -> U256 {
    U256::one() << 159
}

/// `n` whole tokens with `decimals` decimal places
pub fn shift_right(n: u32, decimals: u32) -> U256 {
    U256::from(n) * U256::exp10(decimals as usize)
}

/// `Transfer` from the zero address
pub fn minting_transfer(to: Address, value: U256) -> ReserveEvent {
    ReserveEvent::Transfer {
        from: Address::ZERO,
        to,
        value,
    }
}

/// `Transfer` to the zero address
pub fn burning_transfer(from: Address, value: U256) -> ReserveEvent {
    ReserveEvent::Transfer {
        from,
        to: Address::ZERO,
        value,
    }
}

/// Whether `addresses` contains `x`
pub fn contains_address(addresses: &[Address], x: Address) -> bool {
    addresses.contains(&x)
}
