//! # rsv-types
//!
//! Ledger records exchanged between the harness and a node:
//! - [`SignedTransaction`] - signed legacy transactions and their wire form
//! - [`Receipt`] - mined outcome with status and logs
//! - [`BlockHeader`] - minimal header for the simulated chain

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod error;
pub mod receipt;
pub mod transaction;

pub use block::BlockHeader;
pub use error::{TxError, TxResult};
pub use receipt::{Log, Receipt, TxStatus};
pub use transaction::{create_address, LegacyTx, SignedTransaction, TxSignature};
