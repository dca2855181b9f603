//! World state
//!
//! Accounts and storage live in plain maps. Snapshots are whole clones: the
//! harness state is small and transactions are executed one at a time.

use std::collections::HashMap;

use bytes::Bytes;
use rsv_primitives::{Address, H256};

/// Account record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// Transaction count, or creation count for contracts
    pub nonce: u64,
    /// Balance in wei
    pub balance: u128,
    /// Runtime code, empty for externally owned accounts
    pub code: Bytes,
}

/// Accounts plus contract storage
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    accounts: HashMap<Address, Account>,
    storage: HashMap<Address, HashMap<H256, H256>>,
}

impl WorldState {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get account
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    fn account_mut(&mut self, address: Address) -> &mut Account {
        self.accounts.entry(address).or_default()
    }

    /// Balance, zero for unknown accounts
    pub fn balance(&self, address: &Address) -> u128 {
        self.account(address).map(|a| a.balance).unwrap_or(0)
    }

    /// Credit `amount`
    pub fn add_balance(&mut self, address: Address, amount: u128) {
        let account = self.account_mut(address);
        account.balance = account.balance.saturating_add(amount);
    }

    /// Debit `amount`, false when the balance is short
    pub fn sub_balance(&mut self, address: Address, amount: u128) -> bool {
        let account = self.account_mut(address);
        match account.balance.checked_sub(amount) {
            Some(rest) => {
                account.balance = rest;
                true
            }
            None => false,
        }
    }

    /// Move `value` between accounts, false when `from` is short
    pub fn transfer(&mut self, from: Address, to: Address, value: u128) -> bool {
        if value == 0 {
            return true;
        }
        if !self.sub_balance(from, value) {
            return false;
        }
        self.add_balance(to, value);
        true
    }

    /// Nonce, zero for unknown accounts
    pub fn nonce(&self, address: &Address) -> u64 {
        self.account(address).map(|a| a.nonce).unwrap_or(0)
    }

    /// Bump the nonce, returning the value before the bump
    pub fn increment_nonce(&mut self, address: Address) -> u64 {
        let account = self.account_mut(address);
        let old = account.nonce;
        account.nonce = account.nonce.wrapping_add(1);
        old
    }

    /// Runtime code, empty when none
    pub fn code(&self, address: &Address) -> Bytes {
        self.account(address).map(|a| a.code.clone()).unwrap_or_default()
    }

    /// Install runtime code
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.account_mut(address).code = code;
    }

    /// Whether `address` already holds a contract or has sent transactions
    pub fn is_occupied(&self, address: &Address) -> bool {
        self.account(address)
            .map(|a| a.nonce != 0 || !a.code.is_empty())
            .unwrap_or(false)
    }

    /// Storage slot, zero when unset
    pub fn storage(&self, address: &Address, slot: &H256) -> H256 {
        self.storage
            .get(address)
            .and_then(|slots| slots.get(slot))
            .copied()
            .unwrap_or(H256::ZERO)
    }

    /// Write a storage slot, returning the previous value
    pub fn set_storage(&mut self, address: Address, slot: H256, value: H256) -> H256 {
        let slots = self.storage.entry(address).or_default();
        let previous = if value.is_zero() {
            slots.remove(&slot)
        } else {
            slots.insert(slot, value)
        };
        previous.unwrap_or(H256::ZERO)
    }
}
