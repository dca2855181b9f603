//! Contract-level errors

use rsv_primitives::H256;
use rsv_sdk::abi::{self, ParamType, Token};
use rsv_sdk::SdkError;
use thiserror::Error;

use crate::REVERT_SELECTOR;

/// Errors raised while running or talking to a contract
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// `require` failed; the frame reverts with this reason
    #[error("reverted: {0}")]
    Revert(String),

    /// Frame ran out of gas
    #[error("out of gas")]
    OutOfGas,

    /// State write inside a static call
    #[error("state modification in static context")]
    StaticCall,

    /// Call data or return data does not match the ABI
    #[error("abi error: {0}")]
    Abi(String),

    /// No function with this selector
    #[error("unknown function selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// No function with this name
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Log topic 0 does not name a known event
    #[error("unknown event topic {0}")]
    UnknownEvent(H256),

    /// Log shape does not match the event
    #[error("malformed log: {0}")]
    MalformedLog(String),

    /// Native init code names an artifact that does not exist
    #[error("unknown artifact id 0x{}", hex::encode(.0))]
    UnknownArtifact([u8; 4]),
}

impl From<SdkError> for ContractError {
    fn from(err: SdkError) -> Self {
        ContractError::Abi(err.to_string())
    }
}

/// Result alias for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

/// Revert data for `reason`, encoded as `Error(string)`
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    abi::encode_function_call(REVERT_SELECTOR, &[Token::String(reason.to_string())])
}

/// Reason string from `Error(string)` revert data
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != REVERT_SELECTOR {
        return None;
    }
    abi::decode(&[ParamType::String], &data[4..])
        .ok()?
        .into_iter()
        .next()?
        .into_string()
}
