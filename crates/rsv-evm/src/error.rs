//! Execution errors and outcomes

use thiserror::Error;

/// Exceptional halt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack overflow (max 1024)")]
    StackOverflow,

    /// Jump target is not a JUMPDEST
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Undefined or unsupported opcode
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Offset or size does not fit in memory
    #[error("invalid memory access")]
    InvalidMemoryAccess,

    /// State write inside a static frame
    #[error("state modification in static context")]
    StaticCallViolation,

    /// Host-side failure
    #[error("host error: {0}")]
    Host(String),
}

/// Result alias for interpreter internals
pub type EvmResult<T> = Result<T, EvmError>;

/// Why execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// STOP or end of code
    Stop,
    /// RETURN
    Return,
    /// REVERT, unused gas is refunded
    Revert,
    /// Exceptional halt, all gas is consumed
    Halt(EvmError),
}

/// Outcome of running a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit reason
    pub exit: ExitReason,
    /// Gas consumed by the frame
    pub gas_used: u64,
    /// Return or revert data
    pub output: Vec<u8>,
}

impl ExecutionResult {
    /// Successful return
    pub fn success(gas_used: u64, output: Vec<u8>) -> Self {
        Self {
            exit: ExitReason::Return,
            gas_used,
            output,
        }
    }

    /// Revert with data
    pub fn revert(gas_used: u64, output: Vec<u8>) -> Self {
        Self {
            exit: ExitReason::Revert,
            gas_used,
            output,
        }
    }

    /// Exceptional halt consuming `gas_limit`
    pub fn halt(gas_limit: u64, error: EvmError) -> Self {
        Self {
            exit: ExitReason::Halt(error),
            gas_used: gas_limit,
            output: Vec::new(),
        }
    }

    /// Whether the frame committed
    pub fn is_success(&self) -> bool {
        matches!(self.exit, ExitReason::Stop | ExitReason::Return)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(EvmError::OutOfGas.to_string(), "out of gas");
        assert_eq!(EvmError::InvalidJump(100).to_string(), "invalid jump destination: 100");
        assert_eq!(EvmError::InvalidOpcode(0xfe).to_string(), "invalid opcode: 0xfe");
    }

    #[test]
    fn test_outcome_success_flags() {
        assert!(ExecutionResult::success(10, vec![]).is_success());
        assert!(!ExecutionResult::revert(10, vec![1]).is_success());
        let halted = ExecutionResult::halt(500, EvmError::StackUnderflow);
        assert!(!halted.is_success());
        assert_eq!(halted.gas_used, 500);
    }
}
