//! SDK error types

use thiserror::Error;

/// SDK error
#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(String),

    /// Error object returned by the node
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Node-supplied message
        message: String,
    },

    /// ABI encoding error
    #[error("abi encoding error: {0}")]
    AbiEncode(String),

    /// ABI decoding error
    #[error("abi decoding error: {0}")]
    AbiDecode(String),

    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Response shape did not match
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Missing required field in a response
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Result alias for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;

impl SdkError {
    /// Message text without the variant prefix, for RPC errors the node's own text
    pub fn message(&self) -> String {
        match self {
            SdkError::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<rsv_primitives::AddressError> for SdkError {
    fn from(e: rsv_primitives::AddressError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<rsv_primitives::HashError> for SdkError {
    fn from(e: rsv_primitives::HashError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}
