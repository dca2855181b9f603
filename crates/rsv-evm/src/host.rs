//! Execution host
//!
//! Everything that outlives a single frame goes through [`Host`]: storage,
//! logs, block context and nested frames. The ledger implements it and
//! journals every effect so a failed transaction leaves no trace.

use bytes::Bytes;
use rsv_primitives::{Address, H256};
use rsv_types::Log;

use crate::ExecutionResult;

/// Block-level context visible to contracts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockEnv {
    /// Height of the block being built
    pub number: u64,
    /// Unix seconds
    pub timestamp: u64,
    /// Chain id
    pub chain_id: u64,
    /// Block gas limit
    pub gas_limit: u64,
}

/// One message call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Executing contract
    pub address: Address,
    /// Immediate caller
    pub caller: Address,
    /// Attached value
    pub value: u128,
    /// Call data
    pub data: Bytes,
    /// Gas available to the frame
    pub gas: u64,
    /// Read-only frame
    pub is_static: bool,
}

impl CallContext {
    /// Non-static call without value
    pub fn new(caller: Address, address: Address, data: impl Into<Bytes>, gas: u64) -> Self {
        Self {
            address,
            caller,
            value: 0,
            data: data.into(),
            gas,
            is_static: false,
        }
    }
}

/// Result of a nested creation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOutcome {
    /// Frame result of the constructor
    pub result: ExecutionResult,
    /// New contract, set only on success
    pub address: Option<Address>,
}

/// Ledger services available to executing code
pub trait Host {
    /// Current block context
    fn block(&self) -> BlockEnv;

    /// Read a storage slot, zero when unset
    fn sload(&mut self, address: &Address, slot: &H256) -> H256;

    /// Write a storage slot, returning the previous value
    fn sstore(&mut self, address: &Address, slot: H256, value: H256) -> H256;

    /// Append a log to the transaction
    fn emit_log(&mut self, log: Log);

    /// Run a nested message call
    fn call(&mut self, ctx: CallContext) -> ExecutionResult;

    /// Deploy a contract from `init_code` on behalf of `creator`
    fn create(&mut self, creator: Address, init_code: Bytes, gas: u64) -> CreateOutcome;
}
