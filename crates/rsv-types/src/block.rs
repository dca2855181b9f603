//! Block header for the simulated chain

use rlp::RlpStream;
use rsv_crypto::keccak256;
use rsv_primitives::{BlockNumber, H256};

/// Block header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Parent hash
    pub parent_hash: H256,
    /// Height
    pub number: BlockNumber,
    /// Unix seconds
    pub timestamp: u64,
    /// Gas limit
    pub gas_limit: u64,
    /// Gas used by included transactions
    pub gas_used: u64,
    /// Hashes of included transactions
    pub transactions: Vec<H256>,
}

impl BlockHeader {
    /// Genesis header
    pub fn genesis(timestamp: u64, gas_limit: u64) -> Self {
        Self {
            parent_hash: H256::ZERO,
            number: 0,
            timestamp,
            gas_limit,
            gas_used: 0,
            transactions: Vec::new(),
        }
    }

    /// Empty child of this header
    pub fn child(&self, timestamp: u64) -> Self {
        Self {
            parent_hash: self.hash(),
            number: self.number + 1,
            timestamp,
            gas_limit: self.gas_limit,
            gas_used: 0,
            transactions: Vec::new(),
        }
    }

    /// Keccak of the RLP-encoded header
    pub fn hash(&self) -> H256 {
        let mut stream = RlpStream::new_list(6);
        stream.append(&self.parent_hash);
        stream.append(&self.number);
        stream.append(&self.timestamp);
        stream.append(&self.gas_limit);
        stream.append(&self.gas_used);
        stream.append_list::<H256, H256>(&self.transactions);
        keccak256(&stream.out())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_links_to_parent() {
        let genesis = BlockHeader::genesis(1_700_000_000, 8_000_000);
        let child = genesis.child(1_700_000_001);
        assert_eq!(child.number, 1);
        assert_eq!(child.parent_hash, genesis.hash());
        assert_eq!(child.gas_limit, 8_000_000);
    }

    #[test]
    fn test_hash_changes_with_contents() {
        let a = BlockHeader::genesis(1, 8_000_000);
        let mut b = a.clone();
        b.transactions.push(H256::from_bytes([2; 32]));
        assert_ne!(a.hash(), b.hash());
    }
}
