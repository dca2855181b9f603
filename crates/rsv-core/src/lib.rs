//! # rsv-core
//!
//! The simulated ledger the harness runs against when no external node is
//! configured.
//!
//! - [`Ledger`]: genesis allocation, transaction validation, execution with
//!   rollback on failure, one block per transaction, receipt index, time travel
//! - [`WorldState`]: accounts, code and storage
//!
//! Contract accounts hold either EVM bytecode, run by [`rsv_evm::Interpreter`],
//! or native code naming one of the [`rsv_contracts::Artifact`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod executor;
mod ledger;
mod state;

pub use error::{LedgerError, LedgerResult, GAS_ESTIMATION_FAILED};
pub use executor::{intrinsic_gas, MAX_CALL_DEPTH, TX_CREATE_GAS, TX_GAS};
pub use ledger::{
    Ledger, LedgerConfig, BLOCK_INTERVAL, DEFAULT_BLOCK_GAS_LIMIT, DEFAULT_CHAIN_ID, DEFAULT_GENESIS_TIMESTAMP,
    GENESIS_BALANCE,
};
pub use state::{Account, WorldState};
