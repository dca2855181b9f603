//! Gas schedule
//!
//! Flat per-opcode costs (Berlin tiers without warm/cold accounting) plus
//! the quadratic memory expansion rule.

use crate::opcode::*;

/// Base cost of `op`, excluding memory expansion and dynamic parts
pub fn static_gas(op: u8) -> u64 {
    match op {
        STOP | RETURN | REVERT => 0,
        JUMPDEST => 1,
        ADDRESS | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | TIMESTAMP | NUMBER
        | GASLIMIT | CHAINID | POP | PC | MSIZE | GAS | PUSH0 => 2,
        ADD | SUB | LT | GT | EQ | ISZERO | AND | OR | XOR | NOT | BYTE | SHL | SHR
        | CALLDATALOAD | MLOAD | MSTORE | MSTORE8 | CALLDATACOPY | CODECOPY => 3,
        MUL | DIV | MOD => 5,
        JUMP => 8,
        EXP | JUMPI => 10,
        KECCAK256 => 30,
        SLOAD => 2100,
        SSTORE => 0,
        LOG0..=LOG4 => 375 * (1 + (op - LOG0) as u64),
        PUSH1..=PUSH32 | DUP1..=DUP16 | SWAP1..=SWAP16 => 3,
        _ => 0,
    }
}

/// Cost of a memory of `bytes` bytes
pub fn memory_cost(bytes: usize) -> u64 {
    let words = (bytes as u64).div_ceil(32);
    3 * words + words * words / 512
}

/// Incremental cost of growing memory
pub fn memory_expansion(current: usize, new: usize) -> u64 {
    if new <= current {
        return 0;
    }
    memory_cost(new) - memory_cost(current)
}

/// Per-word copy cost (CALLDATACOPY, CODECOPY)
pub fn copy_gas(size: usize) -> u64 {
    3 * (size as u64).div_ceil(32)
}

/// Per-word hashing cost
pub fn keccak_gas(size: usize) -> u64 {
    6 * (size as u64).div_ceil(32)
}

/// Per-byte log data cost
pub fn log_data_gas(size: usize) -> u64 {
    8 * size as u64
}

/// SSTORE cost given the slot's current and new values
pub fn sstore_gas(current_is_zero: bool, new_is_zero: bool) -> u64 {
    match (current_is_zero, new_is_zero) {
        (true, false) => 20_000,
        _ => 5_000,
    }
}

/// Exponent byte cost
pub fn exp_gas(exponent_bytes: usize) -> u64 {
    50 * exponent_bytes as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cost_curve() {
        assert_eq!(memory_cost(0), 0);
        assert_eq!(memory_cost(32), 3);
        assert_eq!(memory_cost(33), 6);
        // 1024 words: 3*1024 + 1024^2/512
        assert_eq!(memory_cost(32 * 1024), 3072 + 2048);
        assert_eq!(memory_expansion(64, 32), 0);
        assert_eq!(memory_expansion(0, 96), 9);
    }

    #[test]
    fn test_log_costs_scale_with_topics() {
        assert_eq!(static_gas(LOG0), 375);
        assert_eq!(static_gas(LOG4), 1875);
        assert_eq!(log_data_gas(32), 256);
    }

    #[test]
    fn test_sstore_costs() {
        assert_eq!(sstore_gas(true, false), 20_000);
        assert_eq!(sstore_gas(false, false), 5_000);
        assert_eq!(sstore_gas(false, true), 5_000);
    }
}
