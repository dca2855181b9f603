//! # rsv-primitives
//!
//! Fixed-width ledger types shared by every crate in the harness.
//!
//! Addresses and hashes convert to and from 32-byte EVM words so that
//! storage slots, ABI arguments and log topics all speak the same shape.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};

pub use primitive_types::U256;

/// Block height
pub type BlockNumber = u64;

/// Account nonce
pub type Nonce = u64;

/// Gas amount
pub type Gas = u64;

/// Big-endian 32-byte word of a `U256`.
pub fn u256_to_word(value: &U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}
