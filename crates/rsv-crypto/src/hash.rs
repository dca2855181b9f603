//! Keccak-256

use rsv_primitives::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`
pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_bytes(Keccak256::digest(data).into())
}

/// Keccak-256 over the concatenation of `parts`, without an intermediate buffer
pub fn keccak256_concat(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_bytes(hasher.finalize().into())
}
