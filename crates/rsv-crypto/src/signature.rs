//! Recoverable ECDSA over secp256k1

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use rsv_primitives::{Address, H256};

use crate::{keccak256, CryptoError};

/// Signing key
pub type PrivateKey = SigningKey;

/// Verifying key
pub type PublicKey = VerifyingKey;

/// Signature with its recovery id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r scalar
    pub r: [u8; 32],
    /// s scalar, always in the lower half of the curve order
    pub s: [u8; 32],
    /// Recovery id as 27 or 28
    pub v: u8,
}

impl Signature {
    /// Recovery id as 0 or 1
    pub fn recovery_id(&self) -> u8 {
        self.v.saturating_sub(27)
    }
}

/// Parse a 32-byte hex private key
pub fn private_key_from_hex(s: &str) -> Result<PrivateKey, CryptoError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Sign a prehashed message
pub fn sign(message_hash: &H256, key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    // EIP-2: flip to low-s and mirror the parity bit
    let (signature, recovery_id) = match signature.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    Ok(Signature {
        r: signature.r().to_bytes().into(),
        s: signature.s().to_bytes().into(),
        v: recovery_id.to_byte() + 27,
    })
}

/// Recover the signer's public key
pub fn recover_public_key(message_hash: &H256, signature: &Signature) -> Result<PublicKey, CryptoError> {
    let k256_sig = K256Signature::from_scalars(signature.r, signature.s)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::try_from(signature.recovery_id())
        .map_err(|_| CryptoError::InvalidRecoveryId(signature.v as u64))?;

    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &k256_sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Recover the signer's address
pub fn recover_address(message_hash: &H256, signature: &Signature) -> Result<Address, CryptoError> {
    recover_public_key(message_hash, signature).map(|pk| public_key_to_address(&pk))
}

/// Address of an uncompressed public key: last 20 bytes of keccak(x || y)
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

/// Address controlled by `key`
pub fn address_of(key: &PrivateKey) -> Address {
    public_key_to_address(key.verifying_key())
}
