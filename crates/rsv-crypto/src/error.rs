//! Cryptographic errors

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Signature scalars out of range
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Recovery id not 0/1 (or 27/28)
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u64),

    /// Public key recovery failed
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),

    /// Private key bytes are not a valid scalar
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
}
