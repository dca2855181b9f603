//! Deterministic test identities

use rsv_crypto::{address_of, private_key_from_hex, PrivateKey};
use rsv_primitives::Address;

use crate::HarnessResult;

/// The first keys of the well-known 0x development mnemonic
/// `concert load couple harbor equip island argue ramp clarify fence smart topic`
pub const TEST_KEYS: [&str; 6] = [
    "f2f48ee19680706196e2e339e5da3491186e0c4c5030670656b0e0164837257d",
    "5d862464fe9303452126c8bc94274b8c5f9874cbd219789b3eb2128075a76f72",
    "df02719c4df8b9b8ac7f551fcb5d9ef48fa27eef7a66453879f4d8fdc6e78fb1",
    "ff12e391b79415e941a94de3bf3a9aee577aed0731e297d5cfa0b8a1e02fa1d0",
    "752dd9cf65e68cfaba7d60225cbdbc1f4729dd5e5507def72815ed0d8abc6249",
    "efb595a0178eb79a8df953f87c5148402a224cdf725e88c0146727c6aceadccd",
];

/// Test account with private key and address
#[derive(Clone)]
pub struct TestAccount {
    key: PrivateKey,
    address: Address,
}

impl TestAccount {
    /// Create from a known private key (hex string without 0x prefix)
    pub fn from_hex(hex: &str) -> HarnessResult<Self> {
        let key = private_key_from_hex(hex)?;
        let address = address_of(&key);
        Ok(Self { key, address })
    }

    /// Every account in [`TEST_KEYS`], in order
    pub fn all() -> HarnessResult<Vec<Self>> {
        TEST_KEYS.iter().map(|k| Self::from_hex(k)).collect()
    }

    /// Get the account address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signing key
    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    /// Transaction options signing with this account's key
    pub fn signer(&self) -> TransactOpts {
        TransactOpts {
            key: self.key.clone(),
            from: self.address,
            nonce: None,
            gas_price: None,
            gas_limit: None,
            value: 0,
        }
    }
}

impl std::fmt::Debug for TestAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAccount")
            .field("address", &self.address.to_hex())
            .finish()
    }
}

/// Authorization and overrides for one transaction.
///
/// Unset fields are filled from the backend: pending nonce, suggested gas
/// price and a gas estimate.
#[derive(Clone)]
pub struct TransactOpts {
    /// Signing key
    pub key: PrivateKey,
    /// Sender, derived from `key`
    pub from: Address,
    /// Nonce override
    pub nonce: Option<u64>,
    /// Gas price override
    pub gas_price: Option<u128>,
    /// Gas limit override; skips estimation
    pub gas_limit: Option<u64>,
    /// Value in wei
    pub value: u128,
}

impl TransactOpts {
    /// Same options with a fixed gas limit
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Same options with a fixed nonce
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

impl std::fmt::Debug for TransactOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactOpts")
            .field("from", &self.from.to_hex())
            .field("nonce", &self.nonce)
            .field("gas_price", &self.gas_price)
            .field("gas_limit", &self.gas_limit)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_accounts_are_distinct() {
        let accounts = TestAccount::all().unwrap();
        assert_eq!(accounts.len(), 6);
        for (i, a) in accounts.iter().enumerate() {
            for b in &accounts[i + 1..] {
                assert_ne!(a.address(), b.address());
            }
        }
    }

    #[test]
    fn test_account_from_known_key() {
        // Address of the first key of the development mnemonic
        let account = TestAccount::from_hex(TEST_KEYS[0]).unwrap();
        assert_eq!(
            account.address().to_hex(),
            "0x5409ed021d9299bf6814279a6a1411a7e866a631"
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(TestAccount::from_hex("zz").is_err());
        assert!(TestAccount::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_signer_leaves_overrides_unset() {
        let account = TestAccount::from_hex(TEST_KEYS[1]).unwrap();
        let opts = account.signer();
        assert_eq!(opts.from, account.address());
        assert!(opts.nonce.is_none());
        assert!(opts.gas_limit.is_none());
        assert_eq!(opts.value, 0);

        let opts = opts.with_gas_limit(100_000).with_nonce(3);
        assert_eq!(opts.gas_limit, Some(100_000));
        assert_eq!(opts.nonce, Some(3));
    }

    #[test]
    fn test_debug_hides_key() {
        let account = TestAccount::from_hex(TEST_KEYS[0]).unwrap();
        let rendered = format!("{:?}", account.signer());
        assert!(!rendered.contains(TEST_KEYS[0]));
        assert!(rendered.contains("0x5409ed02"));
    }
}
