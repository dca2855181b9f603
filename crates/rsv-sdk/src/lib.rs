//! # rsv-sdk
//!
//! Client-side plumbing used by the harness to talk to a ledger:
//!
//! - **abi**: Solidity ABI encoding and decoding, selectors and event topics
//! - **RpcClient**: typed wrappers over the Ethereum JSON-RPC methods the
//!   harness needs (nonce, gas, call, raw send, receipt lookup)
//! - **Transport**: pluggable request channel, with an HTTP implementation
//!   and a scripted mock for tests
//!
//! ```rust
//! use rsv_sdk::abi::{decode, encode_function_call, function_selector, ParamType, Token};
//! use rsv_sdk::{Address, U256};
//!
//! let data = encode_function_call(
//!     function_selector("transfer(address,uint256)"),
//!     &[Token::Address(Address::from_low_u64(1)), Token::Uint(U256::from(10))],
//! );
//! assert_eq!(data.len(), 4 + 64);
//!
//! let out = decode(&[ParamType::Uint(256)], &[0u8; 32]).unwrap();
//! assert_eq!(out, vec![Token::Uint(U256::zero())]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
mod client;
mod error;
mod transport;
pub mod types;

pub use client::RpcClient;
pub use error::{SdkError, SdkResult};
pub use transport::{MockTransport, Transport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

pub use rsv_primitives::{Address, H256, U256};
pub use rsv_types::{Log, Receipt, SignedTransaction, TxStatus};
