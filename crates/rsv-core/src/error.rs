//! Ledger error types

use rsv_types::TxError;
use thiserror::Error;

/// Message returned when a dry run fails, matching what Ethereum nodes report
pub const GAS_ESTIMATION_FAILED: &str = "gas required exceeds allowance or always failing transaction";

/// Ledger errors
///
/// All of these are node-level rejections: the transaction never reaches a
/// block. A transaction that executes and fails is mined with a failed
/// receipt instead.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Signature does not recover
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Replay-protected for another chain
    #[error("invalid chain id: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// Ledger chain id
        expected: u64,
        /// Chain id in the signature
        got: u64,
    },

    /// Nonce mismatch
    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch {
        /// Expected nonce
        expected: u64,
        /// Actual nonce
        got: u64,
    },

    /// Gas limit above the block gas limit
    #[error("exceeds block gas limit: {limit} > {block_limit}")]
    GasLimitExceeded {
        /// Transaction gas limit
        limit: u64,
        /// Block gas limit
        block_limit: u64,
    },

    /// Gas limit below the intrinsic cost
    #[error("intrinsic gas too low: required {required}, provided {provided}")]
    IntrinsicGas {
        /// Intrinsic cost
        required: u64,
        /// Transaction gas limit
        provided: u64,
    },

    /// Cannot pay for gas and value
    #[error("insufficient funds for gas * price + value: required {required}, available {available}")]
    InsufficientFunds {
        /// Up-front cost
        required: u128,
        /// Sender balance
        available: u128,
    },

    /// Dry run failed
    #[error("gas required exceeds allowance or always failing transaction")]
    GasEstimation,

    /// Read-only call reverted
    #[error("execution reverted: {0}")]
    Reverted(String),
}

impl From<TxError> for LedgerError {
    fn from(e: TxError) -> Self {
        LedgerError::InvalidSignature(e.to_string())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
