//! Solidity storage layout
//!
//! Native contracts keep the same slot layout a compiled contract would:
//! scalars at fixed slots, `mapping(k => v)` at `keccak(k . slot)`, and
//! strings inline when shorter than 32 bytes, otherwise spread from
//! `keccak(slot)`.

use rsv_crypto::keccak256_concat;
use rsv_primitives::{Address, H256, U256};

use crate::ContractResult;

/// Slot of the `index`-th state variable
pub fn slot(index: u64) -> H256 {
    H256::from_u256(U256::from(index))
}

/// Slot of `mapping[key]` for a mapping declared at `base`
pub fn mapping_slot(key: &[u8; 32], base: &H256) -> H256 {
    keccak256_concat(&[&key[..], &base.as_bytes()[..]])
}

/// Slot of `mapping[address]`
pub fn address_slot(key: &Address, base: &H256) -> H256 {
    mapping_slot(&key.to_word(), base)
}

/// Slot of `mapping[outer][inner]`
pub fn nested_address_slot(outer: &Address, inner: &Address, base: &H256) -> H256 {
    address_slot(inner, &address_slot(outer, base))
}

fn offset(base: &H256, index: usize) -> H256 {
    let (next, _) = base.to_u256().overflowing_add(U256::from(index));
    H256::from_u256(next)
}

/// Typed access to one contract's storage
pub trait StorageAccess {
    /// Read a raw word
    fn load(&mut self, slot: &H256) -> ContractResult<H256>;

    /// Write a raw word
    fn store(&mut self, slot: H256, value: H256) -> ContractResult<()>;

    /// Read a `uint256`
    fn load_u256(&mut self, slot: &H256) -> ContractResult<U256> {
        Ok(self.load(slot)?.to_u256())
    }

    /// Write a `uint256`
    fn store_u256(&mut self, slot: H256, value: U256) -> ContractResult<()> {
        self.store(slot, H256::from_u256(value))
    }

    /// Read an `address`
    fn load_address(&mut self, slot: &H256) -> ContractResult<Address> {
        Ok(Address::from_word(self.load(slot)?.as_bytes()))
    }

    /// Write an `address`
    fn store_address(&mut self, slot: H256, value: &Address) -> ContractResult<()> {
        self.store(slot, H256::from_bytes(value.to_word()))
    }

    /// Read a `bool`
    fn load_bool(&mut self, slot: &H256) -> ContractResult<bool> {
        Ok(!self.load(slot)?.is_zero())
    }

    /// Write a `bool`
    fn store_bool(&mut self, slot: H256, value: bool) -> ContractResult<()> {
        self.store_u256(slot, U256::from(value as u8))
    }

    /// Read a `string`
    fn load_string(&mut self, slot: &H256) -> ContractResult<String> {
        let head = self.load(slot)?;
        let bytes = head.as_bytes();
        if bytes[31] & 1 == 0 {
            let len = (bytes[31] / 2) as usize;
            return Ok(String::from_utf8_lossy(&bytes[..len.min(31)]).into_owned());
        }

        let len = ((head.to_u256() - U256::one()) / 2).low_u64() as usize;
        let data_slot = keccak256_concat(&[&slot.as_bytes()[..]]);
        let mut data = Vec::with_capacity(len);
        for i in 0..len.div_ceil(32) {
            let word = self.load(&offset(&data_slot, i))?;
            data.extend_from_slice(word.as_bytes());
        }
        data.truncate(len);
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Write a `string`
    fn store_string(&mut self, slot: H256, value: &str) -> ContractResult<()> {
        let data = value.as_bytes();
        if data.len() < 32 {
            let mut word = [0u8; 32];
            word[..data.len()].copy_from_slice(data);
            word[31] = (data.len() * 2) as u8;
            return self.store(slot, H256::from_bytes(word));
        }

        let data_slot = keccak256_concat(&[&slot.as_bytes()[..]]);
        self.store_u256(slot, U256::from(data.len() * 2 + 1))?;
        for (i, chunk) in data.chunks(32).enumerate() {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            self.store(offset(&data_slot, i), H256::from_bytes(word))?;
        }
        Ok(())
    }
}
