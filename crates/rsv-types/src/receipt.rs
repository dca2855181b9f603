//! Receipts and logs

use bytes::Bytes;
use rsv_primitives::{Address, BlockNumber, H256};

/// Execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxStatus {
    /// Reverted or halted
    Failure = 0,
    /// Completed
    Success = 1,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failure
        }
    }
}

impl From<TxStatus> for bool {
    fn from(status: TxStatus) -> Self {
        status == TxStatus::Success
    }
}

/// Event log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics, topic 0 is the event signature
    pub topics: Vec<H256>,
    /// ABI-encoded non-indexed fields
    pub data: Bytes,
}

impl Log {
    /// Create a log
    pub fn new(address: Address, topics: Vec<H256>, data: Bytes) -> Self {
        Self { address, topics, data }
    }

    /// Event signature topic
    pub fn topic0(&self) -> Option<&H256> {
        self.topics.first()
    }
}

/// Mined transaction outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: H256,
    /// Including block
    pub block_number: BlockNumber,
    /// Status
    pub status: TxStatus,
    /// Gas used by this transaction
    pub gas_used: u64,
    /// Gas used in the block up to and including this transaction
    pub cumulative_gas_used: u64,
    /// Emitted logs, in emission order
    pub logs: Vec<Log>,
    /// Created contract, for successful deployments
    pub contract_address: Option<Address>,
}

impl Receipt {
    /// Receipt with no logs and no created contract
    pub fn new(tx_hash: H256, block_number: BlockNumber, status: TxStatus, gas_used: u64) -> Self {
        Self {
            tx_hash,
            block_number,
            status,
            gas_used,
            cumulative_gas_used: gas_used,
            logs: Vec::new(),
            contract_address: None,
        }
    }

    /// Attach logs
    pub fn with_logs(mut self, logs: Vec<Log>) -> Self {
        self.logs = logs;
        self
    }

    /// Attach the created contract address
    pub fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    /// Whether the transaction succeeded
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}
