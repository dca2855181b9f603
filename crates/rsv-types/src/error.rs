//! Transaction errors

use rsv_crypto::CryptoError;
use thiserror::Error;

/// Transaction encode/sign/recover error
#[derive(Debug, Error)]
pub enum TxError {
    /// Malformed RLP
    #[error("rlp decode error: {0}")]
    Decode(#[from] rlp::DecoderError),

    /// Signing or recovery failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// `v` is neither 27/28 nor a valid EIP-155 value
    #[error("invalid v value: {0}")]
    InvalidV(u64),
}

/// Result alias for transaction operations
pub type TxResult<T> = Result<T, TxError>;
