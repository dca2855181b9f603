//! Solidity ABI encoding and decoding
//!
//! ```rust
//! use rsv_sdk::abi::{event_signature, function_selector};
//!
//! assert_eq!(function_selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
//! assert_eq!(
//!     event_signature("Transfer(address,address,uint256)").to_hex(),
//!     "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
//! );
//! ```

mod decode;
mod encode;
mod types;

pub use decode::decode;
pub use encode::{encode, encode_function_call, event_signature, function_selector, parse_type};
pub use types::{ParamType, Token};
