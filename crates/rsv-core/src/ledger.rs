//! Simulated ledger
//!
//! An instantly-final chain: every accepted transaction is executed and
//! mined into its own block before `send_transaction` returns.

use std::collections::HashMap;

use bytes::Bytes;
use rsv_evm::{BlockEnv, CallContext, ExecutionResult, Host};
use rsv_primitives::{Address, H256};
use rsv_sdk::types::CallRequest;
use rsv_types::{create_address, BlockHeader, Receipt, SignedTransaction, TxStatus};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::executor::{intrinsic_gas, Executor};
use crate::state::WorldState;

/// Default chain ID
pub const DEFAULT_CHAIN_ID: u64 = 1337;

/// Default block gas limit
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 8_000_000;

/// Balance given to each genesis account
pub const GENESIS_BALANCE: u128 = i64::MAX as u128;

/// Timestamp of the genesis block
pub const DEFAULT_GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between consecutive blocks
pub const BLOCK_INTERVAL: u64 = 1;

/// Ledger parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Chain id accepted in EIP-155 signatures
    pub chain_id: u64,
    /// Gas limit of every block
    pub block_gas_limit: u64,
    /// Genesis block timestamp
    pub genesis_timestamp: u64,
    /// Funded accounts
    pub alloc: Vec<(Address, u128)>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            block_gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            genesis_timestamp: DEFAULT_GENESIS_TIMESTAMP,
            alloc: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Fund each of `accounts` with [`GENESIS_BALANCE`]
    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = Address>) -> Self {
        self.alloc
            .extend(accounts.into_iter().map(|address| (address, GENESIS_BALANCE)));
        self
    }
}

/// In-process chain
pub struct Ledger {
    config: LedgerConfig,
    state: WorldState,
    blocks: Vec<BlockHeader>,
    receipts: HashMap<H256, Receipt>,
}

impl Ledger {
    /// Create a ledger at its genesis block
    pub fn new(config: LedgerConfig) -> Self {
        let mut state = WorldState::new();
        for (address, balance) in &config.alloc {
            state.add_balance(*address, *balance);
        }
        let genesis = BlockHeader::genesis(config.genesis_timestamp, config.block_gas_limit);
        Self {
            config,
            state,
            blocks: vec![genesis],
            receipts: HashMap::new(),
        }
    }

    /// Chain id
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Gas limit of every block
    pub fn block_gas_limit(&self) -> u64 {
        self.config.block_gas_limit
    }

    /// Latest mined block
    pub fn head(&self) -> &BlockHeader {
        // Genesis is pushed in `new` and blocks are never removed
        &self.blocks[self.blocks.len() - 1]
    }

    /// Height of the latest block
    pub fn block_number(&self) -> u64 {
        self.head().number
    }

    /// Block at `number`
    pub fn block(&self, number: u64) -> Option<&BlockHeader> {
        self.blocks.get(number as usize)
    }

    /// Timestamp of the latest block
    pub fn timestamp(&self) -> u64 {
        self.head().timestamp
    }

    /// Balance in wei
    pub fn balance(&self, address: &Address) -> u128 {
        self.state.balance(address)
    }

    /// Next nonce of `address`
    pub fn nonce(&self, address: &Address) -> u64 {
        self.state.nonce(address)
    }

    /// Runtime code at `address`
    pub fn code(&self, address: &Address) -> Bytes {
        self.state.code(address)
    }

    /// Raw storage slot
    pub fn storage_at(&self, address: &Address, slot: &H256) -> H256 {
        self.state.storage(address, slot)
    }

    /// Receipt of a mined transaction
    pub fn receipt(&self, tx_hash: &H256) -> Option<&Receipt> {
        self.receipts.get(tx_hash)
    }

    fn env(&self, header: &BlockHeader) -> BlockEnv {
        BlockEnv {
            number: header.number,
            timestamp: header.timestamp,
            chain_id: self.config.chain_id,
            gas_limit: header.gas_limit,
        }
    }

    /// Validate, execute and mine `tx` in a block of its own.
    ///
    /// Returns the transaction hash. A transaction that executes and fails is
    /// still mined, with a failed receipt, no logs and no state change beyond
    /// the nonce bump and gas payment.
    pub fn send_transaction(&mut self, tx: SignedTransaction) -> LedgerResult<H256> {
        let sender = tx.recover_sender()?;
        if let Some(chain_id) = tx.signature.chain_id()? {
            if chain_id != self.config.chain_id {
                return Err(LedgerError::ChainIdMismatch {
                    expected: self.config.chain_id,
                    got: chain_id,
                });
            }
        }

        let expected = self.state.nonce(&sender);
        if tx.nonce() != expected {
            return Err(LedgerError::NonceMismatch {
                expected,
                got: tx.nonce(),
            });
        }
        if tx.gas_limit() > self.config.block_gas_limit {
            return Err(LedgerError::GasLimitExceeded {
                limit: tx.gas_limit(),
                block_limit: self.config.block_gas_limit,
            });
        }
        let intrinsic = intrinsic_gas(&tx.tx.data, tx.is_create());
        if tx.gas_limit() < intrinsic {
            return Err(LedgerError::IntrinsicGas {
                required: intrinsic,
                provided: tx.gas_limit(),
            });
        }
        let gas_cost = tx.gas_limit() as u128 * tx.tx.gas_price;
        let required = gas_cost.saturating_add(tx.tx.value);
        let available = self.state.balance(&sender);
        if available < required {
            return Err(LedgerError::InsufficientFunds { required, available });
        }

        let hash = tx.hash();
        let header = self.head().child(self.timestamp() + BLOCK_INTERVAL);
        let env = self.env(&header);

        self.state.increment_nonce(sender);
        self.state.sub_balance(sender, gas_cost);

        let execution_gas = tx.gas_limit() - intrinsic;
        let (result, logs, contract_address) = {
            let mut executor = Executor::new(&mut self.state, env);
            let (result, contract_address) = match tx.to() {
                Some(to) => {
                    let mut ctx = CallContext::new(sender, to, tx.tx.data.clone(), execution_gas);
                    ctx.value = tx.tx.value;
                    (executor.call(ctx), None)
                }
                None => {
                    let outcome = executor.transact_create(sender, tx.nonce(), tx.tx.data.clone(), execution_gas);
                    (outcome.result, outcome.address)
                }
            };
            (result, executor.into_logs(), contract_address)
        };

        let gas_used = intrinsic + result.gas_used;
        let refund = (tx.gas_limit() - gas_used) as u128 * tx.tx.gas_price;
        self.state.add_balance(sender, refund);

        let status = TxStatus::from(result.is_success());
        let mut receipt = Receipt::new(hash, header.number, status, gas_used);
        if status == TxStatus::Success {
            receipt = receipt.with_logs(logs);
            if let Some(address) = contract_address {
                receipt = receipt.with_contract_address(address);
            }
        }

        debug!(
            tx = %hash,
            from = %sender,
            block = header.number,
            ?status,
            gas_used,
            logs = receipt.logs.len(),
            "mined transaction"
        );
        self.mine(header, vec![hash], gas_used);
        self.receipts.insert(hash, receipt);
        Ok(hash)
    }

    fn mine(&mut self, mut header: BlockHeader, transactions: Vec<H256>, gas_used: u64) {
        header.transactions = transactions;
        header.gas_used = gas_used;
        self.blocks.push(header);
    }

    /// Dry-run `request` against the latest state and return the gas it needs
    pub fn estimate_gas(&self, request: &CallRequest) -> LedgerResult<u64> {
        let data = request.data.clone().unwrap_or_default();
        let intrinsic = intrinsic_gas(&data, request.to.is_none());
        let cap = request.gas.unwrap_or(self.config.block_gas_limit);
        if cap < intrinsic {
            return Err(LedgerError::GasEstimation);
        }

        let result = self.dry_run(request, cap - intrinsic, false);
        if !result.is_success() {
            debug!(to = ?request.to, "gas estimation failed");
            return Err(LedgerError::GasEstimation);
        }
        Ok(intrinsic + result.gas_used)
    }

    /// Read-only call against the latest state
    pub fn call(&self, request: &CallRequest) -> LedgerResult<Vec<u8>> {
        let gas = request.gas.unwrap_or(self.config.block_gas_limit);
        let result = self.dry_run(request, gas, true);
        if !result.is_success() {
            let reason = rsv_contracts::decode_revert_reason(&result.output)
                .unwrap_or_else(|| format!("{:?}", result.exit));
            return Err(LedgerError::Reverted(reason));
        }
        Ok(result.output)
    }

    fn dry_run(&self, request: &CallRequest, gas: u64, is_static: bool) -> ExecutionResult {
        let mut scratch = self.state.clone();
        let env = self.env(self.head());
        let from = request.from.unwrap_or(Address::ZERO);
        let data = request.data.clone().unwrap_or_default();
        let mut executor = Executor::new(&mut scratch, env);

        match request.to {
            Some(to) => {
                let mut ctx = CallContext::new(from, to, data, gas);
                ctx.value = request.value.unwrap_or(0);
                ctx.is_static = is_static;
                executor.call(ctx)
            }
            None => {
                let nonce = self.state.nonce(&from);
                executor.transact_create(from, nonce, data, gas).result
            }
        }
    }

    /// Move the clock forward by `seconds` and mine an empty block
    pub fn adjust_time(&mut self, seconds: u64) {
        let header = self.head().child(self.timestamp() + seconds);
        debug!(seconds, block = header.number, timestamp = header.timestamp, "adjusted time");
        self.mine(header, Vec::new(), 0);
    }

    /// Address a contract deployed by `sender` in its next transaction gets
    pub fn next_contract_address(&self, sender: &Address) -> Address {
        create_address(sender, self.state.nonce(sender))
    }
}
