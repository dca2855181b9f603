//! Legacy transactions
//!
//! Signing follows EIP-155 when a chain id is supplied and the original
//! Homestead scheme (`v` = 27/28) otherwise.

use bytes::Bytes;
use rlp::{Rlp, RlpStream};
use rsv_crypto::{keccak256, recover_address, sign, PrivateKey, Signature};
use rsv_primitives::{Address, H256, U256};

use crate::error::{TxError, TxResult};

/// Unsigned legacy transaction
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LegacyTx {
    /// Sender nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient, `None` for contract creation
    pub to: Option<Address>,
    /// Value in wei
    pub value: u128,
    /// Call data or init code
    pub data: Bytes,
}

/// Signature as carried in the transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// 27/28 (Homestead) or `chain_id * 2 + 35/36` (EIP-155)
    pub v: u64,
    /// r scalar
    pub r: H256,
    /// s scalar
    pub s: H256,
}

impl TxSignature {
    /// Chain id encoded in `v`, `None` for Homestead signatures
    pub fn chain_id(&self) -> TxResult<Option<u64>> {
        match self.v {
            27 | 28 => Ok(None),
            v if v >= 35 => Ok(Some((v - 35) / 2)),
            v => Err(TxError::InvalidV(v)),
        }
    }

    /// Parity bit as 0/1
    pub fn recovery_id(&self) -> u8 {
        match self.v {
            27 | 28 => (self.v - 27) as u8,
            v => ((v - 35) % 2) as u8,
        }
    }
}

/// Signed legacy transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction body
    pub tx: LegacyTx,
    /// Signature
    pub signature: TxSignature,
}

fn append_body(stream: &mut RlpStream, tx: &LegacyTx) {
    stream.append(&tx.nonce);
    stream.append(&tx.gas_price);
    stream.append(&tx.gas_limit);
    match &tx.to {
        Some(to) => stream.append(to),
        None => stream.append_empty_data(),
    };
    stream.append(&tx.value);
    stream.append(&tx.data.to_vec());
}

impl LegacyTx {
    /// Hash the signer commits to
    pub fn signing_hash(&self, chain_id: Option<u64>) -> H256 {
        let mut stream = match chain_id {
            Some(_) => RlpStream::new_list(9),
            None => RlpStream::new_list(6),
        };
        append_body(&mut stream, self);
        if let Some(id) = chain_id {
            stream.append(&id);
            stream.append(&0u8);
            stream.append(&0u8);
        }
        keccak256(&stream.out())
    }

    /// Sign with `key`, replay-protected when `chain_id` is given
    pub fn sign(self, key: &PrivateKey, chain_id: Option<u64>) -> TxResult<SignedTransaction> {
        let sig = sign(&self.signing_hash(chain_id), key)?;
        let parity = sig.recovery_id() as u64;
        let v = match chain_id {
            Some(id) => id * 2 + 35 + parity,
            None => 27 + parity,
        };
        Ok(SignedTransaction {
            tx: self,
            signature: TxSignature {
                v,
                r: H256::from_bytes(sig.r),
                s: H256::from_bytes(sig.s),
            },
        })
    }
}

impl SignedTransaction {
    /// Recipient
    pub fn to(&self) -> Option<Address> {
        self.tx.to
    }

    /// Sender nonce
    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    /// Gas limit
    pub fn gas_limit(&self) -> u64 {
        self.tx.gas_limit
    }

    /// Whether this deploys a contract
    pub fn is_create(&self) -> bool {
        self.tx.to.is_none()
    }

    /// Network transaction hash
    pub fn hash(&self) -> H256 {
        keccak256(&self.encode_rlp())
    }

    /// Recover the sender from the signature
    pub fn recover_sender(&self) -> TxResult<Address> {
        let chain_id = self.signature.chain_id()?;
        let hash = self.tx.signing_hash(chain_id);
        let sig = Signature {
            r: *self.signature.r.as_bytes(),
            s: *self.signature.s.as_bytes(),
            v: self.signature.recovery_id() + 27,
        };
        Ok(recover_address(&hash, &sig)?)
    }

    /// Raw form accepted by `eth_sendRawTransaction`
    pub fn encode_rlp(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        append_body(&mut stream, &self.tx);
        stream.append(&self.signature.v);
        stream.append(&self.signature.r.to_u256());
        stream.append(&self.signature.s.to_u256());
        stream.out().to_vec()
    }

    /// Parse the raw form
    pub fn decode_rlp(raw: &[u8]) -> TxResult<Self> {
        let rlp = Rlp::new(raw);
        if rlp.item_count()? != 9 {
            return Err(rlp::DecoderError::RlpIncorrectListLen.into());
        }
        let to_item = rlp.at(3)?;
        let to = if to_item.is_empty() {
            None
        } else {
            Some(to_item.as_val()?)
        };
        let data: Vec<u8> = rlp.val_at(5)?;
        let r: U256 = rlp.val_at(7)?;
        let s: U256 = rlp.val_at(8)?;
        Ok(SignedTransaction {
            tx: LegacyTx {
                nonce: rlp.val_at(0)?,
                gas_price: rlp.val_at(1)?,
                gas_limit: rlp.val_at(2)?,
                to,
                value: rlp.val_at(4)?,
                data: Bytes::from(data),
            },
            signature: TxSignature {
                v: rlp.val_at(6)?,
                r: H256::from_u256(r),
                s: H256::from_u256(s),
            },
        })
    }
}

/// Address of a contract created by `sender` at `nonce`
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsv_crypto::{address_of, private_key_from_hex};

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn sample_tx() -> LegacyTx {
        LegacyTx {
            nonce: 3,
            gas_price: 1,
            gas_limit: 21_000,
            to: Some(Address::from_low_u64(100)),
            value: 0,
            data: Bytes::new(),
        }
    }

    // ==================== Signing ====================

    #[test]
    fn test_eip155_signature_encodes_chain_id() {
        let key = private_key_from_hex(KEY).unwrap();
        let signed = sample_tx().sign(&key, Some(1337)).unwrap();
        assert!(signed.signature.v == 2709 || signed.signature.v == 2710);
        assert_eq!(signed.signature.chain_id().unwrap(), Some(1337));
        assert_eq!(signed.recover_sender().unwrap(), address_of(&key));
    }

    #[test]
    fn test_homestead_signature() {
        let key = private_key_from_hex(KEY).unwrap();
        let signed = sample_tx().sign(&key, None).unwrap();
        assert!(signed.signature.v == 27 || signed.signature.v == 28);
        assert_eq!(signed.signature.chain_id().unwrap(), None);
        assert_eq!(signed.recover_sender().unwrap(), address_of(&key));
    }

    #[test]
    fn test_signing_hash_depends_on_chain_id() {
        let tx = sample_tx();
        assert_ne!(tx.signing_hash(None), tx.signing_hash(Some(1)));
        assert_ne!(tx.signing_hash(Some(1)), tx.signing_hash(Some(2)));
    }

    #[test]
    fn test_invalid_v() {
        let sig = TxSignature { v: 30, r: H256::ZERO, s: H256::ZERO };
        assert!(matches!(sig.chain_id(), Err(TxError::InvalidV(30))));
    }

    // ==================== Wire format ====================

    #[test]
    fn test_raw_encoding_survives_decode() {
        let key = private_key_from_hex(KEY).unwrap();
        let mut tx = sample_tx();
        tx.to = None;
        tx.data = Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]);
        let signed = tx.sign(&key, Some(1337)).unwrap();

        let decoded = SignedTransaction::decode_rlp(&signed.encode_rlp()).unwrap();
        assert_eq!(decoded, signed);
        assert!(decoded.is_create());
        assert_eq!(decoded.hash(), signed.hash());
    }

    #[test]
    fn test_decode_rejects_short_list() {
        let mut stream = RlpStream::new_list(2);
        stream.append(&1u64);
        stream.append(&2u64);
        assert!(SignedTransaction::decode_rlp(&stream.out()).is_err());
    }

    // ==================== Create address ====================

    #[test]
    fn test_create_address_known_vector() {
        // First contract deployed by 0xf39f...2266 lands at 0x5fbd...0aa3
        let sender = Address::from_hex("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        assert_eq!(
            create_address(&sender, 0).to_hex(),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
    }

    #[test]
    fn test_create_address_varies_with_nonce() {
        let sender = Address::from_low_u64(1);
        assert_ne!(create_address(&sender, 0), create_address(&sender, 1));
    }
}
