//! # rsv-contracts
//!
//! The Reserve token family, run natively by the simulated ledger:
//!
//! - [`reserve`]: `Reserve` and `ReserveV2`, an ERC20 with minter, pauser
//!   and freezer roles and an ownership handoff for upgrades
//! - [`eternal_storage`]: `ReserveEternalStorage`, the balance and allowance
//!   store that outlives a token contract, with an escape hatch
//! - [`events`]: typed events with stable display forms and log codecs
//! - [`abi`]: function tables shared by the dispatcher and the client bindings
//! - [`artifacts`]: deployable init code, including the time-utility bytecode
//!
//! Native contracts read and write ledger state through [`rsv_evm::Host`],
//! the same seam the bytecode interpreter uses.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod artifacts;
mod error;
pub mod eternal_storage;
pub mod events;
mod native;
pub mod reserve;
pub mod storage;

pub use abi::{Abi, Function, StateMutability};
pub use artifacts::{parse_native_code, Artifact, NATIVE_PREFIX};
pub use error::{decode_revert_reason, encode_revert_reason, ContractError, ContractResult};
pub use events::{EternalStorageEvent, Event, ReserveEvent};
pub use native::{construct, execute, NativeFrame};

/// Solidity `Error(string)` selector carried by revert data
pub const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
