//! # rsv-e2e
//!
//! Transaction-assertion harness for the Reserve token family.
//!
//! ## Pieces
//!
//! 1. **Backend**: one interface over the in-process simulated ledger and
//!    an external node reached over JSON-RPC, with optional time travel
//! 2. **Bindings**: typed handles whose mutators sign, estimate and send a
//!    transaction, and whose views decode return values
//! 3. **LogParserRegistry**: per-address decoders for receipt logs
//! 4. **TestSuite**: `require_tx`, `require_tx_with_strict_events`,
//!    `require_tx_fails` and ledger-visible assertions, with a fresh
//!    deployment before every scenario
//!
//! ## Usage
//!
//! ```ignore
//! cargo test -p rsv-e2e
//! COVERAGE_ENABLED=1 cargo test -p rsv-e2e --test scenarios
//! ```
//!
//! The `scenarios` test target has its own `main`: it sets up one suite for
//! the run, redeploys before each scenario and tears down once at the end.

mod accounts;
mod backend;
pub mod bindings;
mod config;
mod registry;
mod suite;

pub use accounts::{TestAccount, TransactOpts, TEST_KEYS};
pub use backend::{wait_mined, Backend, Clock, CoverageBackend, RpcBackend, SimulatedBackend, COVERAGE_METHOD};
pub use bindings::{BindingError, BindingResult, BoundContract, Reserve, ReserveEternalStorage, ReserveV2, TimeUtil};
pub use config::HarnessConfig;
pub use registry::{check_at_least_events, check_strict_events, LogParser, LogParserRegistry};
pub use suite::{
    burning_transfer, contains_address, init_tracing, max_uint160, max_uint256, min_int160_as_uint160,
    minting_transfer, shift_right, AtLeastEvents, StrictEvents, TestSuite,
};

/// Harness result
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Harness errors
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Setup failed
    #[error("setup failed: {0}")]
    Setup(String),

    /// Node rejected a dry run as always failing
    #[error("{0}")]
    GasEstimation(String),

    /// Simulated ledger rejected a request
    #[error("ledger error: {0}")]
    Ledger(rsv_core::LedgerError),

    /// RPC or ABI error from the client
    #[error("rpc error: {0}")]
    Rpc(#[from] rsv_sdk::SdkError),

    /// Transaction encoding or signing error
    #[error("transaction error: {0}")]
    Transaction(#[from] rsv_types::TxError),

    /// Key handling error
    #[error("crypto error: {0}")]
    Crypto(#[from] rsv_crypto::CryptoError),

    /// Log does not decode
    #[error("contract error: {0}")]
    Contract(#[from] rsv_contracts::ContractError),

    /// Log from an address with no registered parser
    #[error("got an event from an unexpected contract address: {0}")]
    UnknownEmitter(rsv_primitives::Address),

    /// Events did not match
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Configuration could not be read
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem or child-process error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rsv_core::LedgerError> for HarnessError {
    fn from(e: rsv_core::LedgerError) -> Self {
        match e {
            rsv_core::LedgerError::GasEstimation => HarnessError::GasEstimation(e.to_string()),
            other => HarnessError::Ledger(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_estimation_failure_maps_to_gas_estimation() {
        let err = HarnessError::from(rsv_core::LedgerError::GasEstimation);
        assert!(matches!(err, HarnessError::GasEstimation(_)));
        assert_eq!(err.to_string(), rsv_core::GAS_ESTIMATION_FAILED);
    }

    #[test]
    fn test_other_ledger_errors_keep_their_variant() {
        let err = HarnessError::from(rsv_core::LedgerError::NonceMismatch { expected: 1, got: 0 });
        assert!(matches!(err, HarnessError::Ledger(_)));
        assert_eq!(err.to_string(), "ledger error: nonce mismatch: expected 1, got 0");
    }
}
