//! # rsv-crypto
//!
//! - Keccak-256 hashing
//! - Recoverable secp256k1 signatures (EIP-2 low-s)
//! - Address derivation from keys

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, keccak256_concat};
pub use signature::{
    address_of, private_key_from_hex, public_key_to_address, recover_address,
    recover_public_key, sign, PrivateKey, PublicKey, Signature,
};
