//! EVM bytecode interpreter

use bytes::Bytes;
use rsv_crypto::keccak256;
use rsv_primitives::{H256, U256};
use rsv_types::Log;

use crate::gas;
use crate::memory::Memory;
use crate::opcode::*;
use crate::stack::Stack;
use crate::{CallContext, EvmError, EvmResult, ExecutionResult, ExitReason, Host};

/// Offsets and sizes above this are treated as out of gas
const MAX_MEMORY: usize = u32::MAX as usize;

enum Control {
    Continue,
    Exit(ExitReason),
}

/// Single-frame interpreter
#[derive(Clone, Debug)]
pub struct Interpreter {
    code: Bytes,
    pc: usize,
    stack: Stack,
    memory: Memory,
    gas_limit: u64,
    gas_left: u64,
    jump_dests: Vec<bool>,
    output: Vec<u8>,
}

impl Interpreter {
    /// Prepare `code` to run with `gas_limit`
    pub fn new(code: impl Into<Bytes>, gas_limit: u64) -> Self {
        let code = code.into();
        let jump_dests = analyze_jump_dests(&code);
        Self {
            code,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas_limit,
            gas_left: gas_limit,
            jump_dests,
            output: Vec::new(),
        }
    }

    /// Run to completion
    pub fn run(&mut self, ctx: &CallContext, host: &mut dyn Host) -> ExecutionResult {
        loop {
            match self.step(ctx, host) {
                Ok(Control::Continue) => {}
                Ok(Control::Exit(exit)) => {
                    let gas_used = self.gas_limit - self.gas_left;
                    let output = std::mem::take(&mut self.output);
                    return ExecutionResult { exit, gas_used, output };
                }
                Err(error) => {
                    tracing::trace!(pc = self.pc, %error, "exceptional halt");
                    return ExecutionResult::halt(self.gas_limit, error);
                }
            }
        }
    }

    fn use_gas(&mut self, amount: u64) -> EvmResult<()> {
        self.gas_left = self.gas_left.checked_sub(amount).ok_or(EvmError::OutOfGas)?;
        Ok(())
    }

    /// Charge for and grow memory to cover `[offset, offset + size)`
    fn touch_memory(&mut self, offset: U256, size: U256) -> EvmResult<(usize, usize)> {
        if size.is_zero() {
            return Ok((0, 0));
        }
        let offset = to_memory_index(offset)?;
        let size = to_memory_index(size)?;
        let new_size = self
            .memory
            .required_size(offset, size)
            .ok_or(EvmError::OutOfGas)?;
        self.use_gas(gas::memory_expansion(self.memory.len(), new_size))?;
        self.memory.resize(new_size);
        Ok((offset, size))
    }

    fn pop_address(&mut self) -> EvmResult<usize> {
        let value = self.stack.pop()?;
        if value > U256::from(usize::MAX) {
            return Err(EvmError::InvalidJump(usize::MAX));
        }
        Ok(value.as_usize())
    }

    fn jump_to(&mut self, dest: usize) -> EvmResult<()> {
        if !self.jump_dests.get(dest).copied().unwrap_or(false) {
            return Err(EvmError::InvalidJump(dest));
        }
        self.pc = dest;
        Ok(())
    }

    fn step(&mut self, ctx: &CallContext, host: &mut dyn Host) -> EvmResult<Control> {
        let Some(&op) = self.code.get(self.pc) else {
            return Ok(Control::Exit(ExitReason::Stop));
        };
        self.use_gas(gas::static_gas(op))?;
        self.pc += 1;

        match op {
            STOP => return Ok(Control::Exit(ExitReason::Stop)),

            ADD | MUL | SUB | DIV | MOD | LT | GT | EQ | AND | OR | XOR | BYTE | SHL | SHR => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(binary_op(op, a, b)?)?;
            }
            EXP => {
                let base = self.stack.pop()?;
                let exponent = self.stack.pop()?;
                self.use_gas(gas::exp_gas((exponent.bits() + 7) / 8))?;
                self.stack.push(base.overflowing_pow(exponent).0)?;
            }
            ISZERO => {
                let a = self.stack.pop()?;
                self.stack.push(bool_word(a.is_zero()))?;
            }
            NOT => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }

            KECCAK256 => {
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                let (offset, size) = self.touch_memory(offset, size)?;
                self.use_gas(gas::keccak_gas(size))?;
                let hash = keccak256(self.memory.slice(offset, size));
                self.stack.push(hash.to_u256())?;
            }

            ADDRESS => self.stack.push(ctx.address.to_u256())?,
            CALLER => self.stack.push(ctx.caller.to_u256())?,
            CALLVALUE => self.stack.push(U256::from(ctx.value))?,
            CALLDATALOAD => {
                let offset = self.stack.pop()?;
                let mut word = [0u8; 32];
                if offset < U256::from(ctx.data.len()) {
                    let start = offset.as_usize();
                    let end = (start + 32).min(ctx.data.len());
                    word[..end - start].copy_from_slice(&ctx.data[start..end]);
                }
                self.stack.push(U256::from_big_endian(&word))?;
            }
            CALLDATASIZE => self.stack.push(U256::from(ctx.data.len()))?,
            CODESIZE => self.stack.push(U256::from(self.code.len()))?,
            CALLDATACOPY | CODECOPY => {
                let dest = self.stack.pop()?;
                let src = self.stack.pop()?;
                let size = self.stack.pop()?;
                let (dest, size) = self.touch_memory(dest, size)?;
                self.use_gas(gas::copy_gas(size))?;
                let source: &[u8] = if op == CALLDATACOPY { &ctx.data[..] } else { &self.code[..] };
                let tail = if src < U256::from(source.len()) {
                    &source[src.as_usize()..]
                } else {
                    &[]
                };
                let tail = tail.to_vec();
                self.memory.store_padded(dest, size, &tail);
            }

            TIMESTAMP => self.stack.push(U256::from(host.block().timestamp))?,
            NUMBER => self.stack.push(U256::from(host.block().number))?,
            GASLIMIT => self.stack.push(U256::from(host.block().gas_limit))?,
            CHAINID => self.stack.push(U256::from(host.block().chain_id))?,

            POP => {
                self.stack.pop()?;
            }
            MLOAD => {
                let offset = self.stack.pop()?;
                let (offset, _) = self.touch_memory(offset, U256::from(32))?;
                let value = self.memory.load_word(offset);
                self.stack.push(value)?;
            }
            MSTORE => {
                let offset = self.stack.pop()?;
                let value = self.stack.pop()?;
                let (offset, _) = self.touch_memory(offset, U256::from(32))?;
                self.memory.store_word(offset, &value);
            }
            MSTORE8 => {
                let offset = self.stack.pop()?;
                let value = self.stack.pop()?;
                let (offset, _) = self.touch_memory(offset, U256::one())?;
                self.memory.store_byte(offset, value.byte(0));
            }
            SLOAD => {
                let slot = H256::from_u256(self.stack.pop()?);
                let value = host.sload(&ctx.address, &slot);
                self.stack.push(value.to_u256())?;
            }
            SSTORE => {
                if ctx.is_static {
                    return Err(EvmError::StaticCallViolation);
                }
                let slot = H256::from_u256(self.stack.pop()?);
                let value = H256::from_u256(self.stack.pop()?);
                let current = host.sload(&ctx.address, &slot);
                self.use_gas(gas::sstore_gas(current.is_zero(), value.is_zero()))?;
                host.sstore(&ctx.address, slot, value);
            }
            JUMP => {
                let dest = self.pop_address()?;
                self.jump_to(dest)?;
            }
            JUMPI => {
                let dest = self.pop_address()?;
                let condition = self.stack.pop()?;
                if !condition.is_zero() {
                    self.jump_to(dest)?;
                }
            }
            PC => self.stack.push(U256::from(self.pc - 1))?,
            MSIZE => self.stack.push(U256::from(self.memory.len()))?,
            GAS => self.stack.push(U256::from(self.gas_left))?,
            JUMPDEST => {}

            PUSH0 => self.stack.push(U256::zero())?,
            PUSH1..=PUSH32 => {
                let n = immediate_size(op);
                let mut word = [0u8; 32];
                let available = self.code.len().saturating_sub(self.pc).min(n);
                // Immediates running past the end of code read as zero
                word[32 - n..32 - n + available]
                    .copy_from_slice(&self.code[self.pc..self.pc + available]);
                self.stack.push(U256::from_big_endian(&word))?;
                self.pc += n;
            }
            DUP1..=DUP16 => self.stack.dup((op - DUP1 + 1) as usize)?,
            SWAP1..=SWAP16 => self.stack.swap((op - SWAP1 + 1) as usize)?,

            LOG0..=LOG4 => {
                if ctx.is_static {
                    return Err(EvmError::StaticCallViolation);
                }
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                let mut topics = Vec::with_capacity((op - LOG0) as usize);
                for _ in 0..(op - LOG0) {
                    topics.push(H256::from_u256(self.stack.pop()?));
                }
                let (offset, size) = self.touch_memory(offset, size)?;
                self.use_gas(gas::log_data_gas(size))?;
                let data = Bytes::copy_from_slice(self.memory.slice(offset, size));
                host.emit_log(Log::new(ctx.address, topics, data));
            }

            RETURN | REVERT => {
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                let (offset, size) = self.touch_memory(offset, size)?;
                self.output = self.memory.slice(offset, size).to_vec();
                let exit = if op == RETURN { ExitReason::Return } else { ExitReason::Revert };
                return Ok(Control::Exit(exit));
            }

            other => return Err(EvmError::InvalidOpcode(other)),
        }
        Ok(Control::Continue)
    }
}

fn binary_op(op: u8, a: U256, b: U256) -> EvmResult<U256> {
    let result = match op {
        ADD => a.overflowing_add(b).0,
        MUL => a.overflowing_mul(b).0,
        SUB => a.overflowing_sub(b).0,
        DIV => a.checked_div(b).unwrap_or_default(),
        MOD => a.checked_rem(b).unwrap_or_default(),
        LT => bool_word(a < b),
        GT => bool_word(a > b),
        EQ => bool_word(a == b),
        AND => a & b,
        OR => a | b,
        XOR => a ^ b,
        // BYTE: a is the big-endian index into b
        BYTE => {
            if a < U256::from(32) {
                U256::from(b.byte(31 - a.as_usize()))
            } else {
                U256::zero()
            }
        }
        // shifts: a is the shift amount, b the value
        SHL => {
            if a < U256::from(256) {
                b << a.as_usize()
            } else {
                U256::zero()
            }
        }
        SHR => {
            if a < U256::from(256) {
                b >> a.as_usize()
            } else {
                U256::zero()
            }
        }
        other => return Err(EvmError::InvalidOpcode(other)),
    };
    Ok(result)
}

fn bool_word(b: bool) -> U256 {
    if b {
        U256::one()
    } else {
        U256::zero()
    }
}

fn to_memory_index(value: U256) -> EvmResult<usize> {
    if value > U256::from(MAX_MEMORY) {
        return Err(EvmError::OutOfGas);
    }
    Ok(value.as_usize())
}

/// JUMPDEST positions outside PUSH immediates
fn analyze_jump_dests(code: &[u8]) -> Vec<bool> {
    let mut dests = vec![false; code.len()];
    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if op == JUMPDEST {
            dests[i] = true;
        }
        i += 1 + immediate_size(op);
    }
    dests
}
