//! Operand stack

use rsv_primitives::U256;

use crate::{EvmError, EvmResult};

/// Maximum stack depth
pub const STACK_LIMIT: usize = 1024;

/// Word stack with the EVM depth limit
#[derive(Clone, Debug, Default)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(32),
        }
    }

    /// Push a word
    pub fn push(&mut self, value: U256) -> EvmResult<()> {
        if self.data.len() >= STACK_LIMIT {
            return Err(EvmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop the top word
    pub fn pop(&mut self) -> EvmResult<U256> {
        self.data.pop().ok_or(EvmError::StackUnderflow)
    }

    /// Duplicate the `n`th word from the top (1-based)
    pub fn dup(&mut self, n: usize) -> EvmResult<()> {
        let len = self.data.len();
        if n == 0 || n > len {
            return Err(EvmError::StackUnderflow);
        }
        self.push(self.data[len - n])
    }

    /// Swap the top with the `n`th word below it (1-based)
    pub fn swap(&mut self, n: usize) -> EvmResult<()> {
        let len = self.data.len();
        if n == 0 || len < n + 1 {
            return Err(EvmError::StackUnderflow);
        }
        self.data.swap(len - 1, len - 1 - n);
        Ok(())
    }

    /// Current depth
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
