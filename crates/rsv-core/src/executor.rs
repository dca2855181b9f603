//! Transaction executor
//!
//! [`Executor`] is the ledger's [`Host`]: it routes each frame to the native
//! implementation of its artifact or to the bytecode interpreter, and gives
//! every nested frame its own snapshot so a failed callee leaves no writes
//! or logs behind.

use bytes::Bytes;
use rsv_contracts::{construct, execute, parse_native_code};
use rsv_evm::{BlockEnv, CallContext, CreateOutcome, EvmError, ExecutionResult, Host, Interpreter};
use rsv_primitives::{Address, H256};
use rsv_types::{create_address, Log};
use tracing::trace;

use crate::state::WorldState;

/// Maximum nesting of message calls
pub const MAX_CALL_DEPTH: usize = 1024;

/// Base cost of any transaction
pub const TX_GAS: u64 = 21_000;

/// Extra base cost of a contract creation
pub const TX_CREATE_GAS: u64 = 32_000;

const TX_DATA_ZERO_GAS: u64 = 4;
const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// Gas charged before the first opcode runs
pub fn intrinsic_gas(data: &[u8], is_create: bool) -> u64 {
    let data_gas: u64 = data
        .iter()
        .map(|b| if *b == 0 { TX_DATA_ZERO_GAS } else { TX_DATA_NON_ZERO_GAS })
        .sum();
    let base = if is_create { TX_GAS + TX_CREATE_GAS } else { TX_GAS };
    base + data_gas
}

/// Executes one transaction against borrowed state
pub(crate) struct Executor<'a> {
    state: &'a mut WorldState,
    env: BlockEnv,
    logs: Vec<Log>,
    depth: usize,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(state: &'a mut WorldState, env: BlockEnv) -> Self {
        Self {
            state,
            env,
            logs: Vec::new(),
            depth: 0,
        }
    }

    /// Logs emitted by committed frames, in order
    pub(crate) fn into_logs(self) -> Vec<Log> {
        self.logs
    }

    /// Top-level creation at a precomputed address
    pub(crate) fn transact_create(&mut self, creator: Address, nonce: u64, init_code: Bytes, gas: u64) -> CreateOutcome {
        let address = create_address(&creator, nonce);
        self.deploy(creator, address, init_code, gas)
    }

    fn run(&mut self, code: Bytes, ctx: &CallContext) -> ExecutionResult {
        let native = parse_native_code(&code).map(|parsed| parsed.map(|(artifact, _)| artifact));
        match native {
            Some(Ok(artifact)) => execute(self, ctx, artifact),
            Some(Err(err)) => ExecutionResult::halt(ctx.gas, EvmError::Host(err.to_string())),
            None => Interpreter::new(code, ctx.gas).run(ctx, self),
        }
    }

    fn deploy(&mut self, creator: Address, address: Address, init_code: Bytes, gas: u64) -> CreateOutcome {
        if self.state.is_occupied(&address) {
            return CreateOutcome {
                result: ExecutionResult::halt(gas, EvmError::Host(format!("address collision at {}", address))),
                address: None,
            };
        }

        let snapshot = self.state.clone();
        let log_mark = self.logs.len();
        // New contracts start at nonce 1 (EIP-161)
        self.state.increment_nonce(address);
        let ctx = CallContext::new(creator, address, Bytes::new(), gas);

        self.depth += 1;
        let (result, code) = match parse_native_code(&init_code) {
            Some(Ok((artifact, args))) => {
                let result = construct(self, &ctx, artifact, args);
                (result, Bytes::from(artifact.runtime_code()))
            }
            Some(Err(err)) => (ExecutionResult::halt(gas, EvmError::Host(err.to_string())), Bytes::new()),
            None => {
                let mut result = Interpreter::new(init_code.clone(), gas).run(&ctx, self);
                let code = Bytes::from(std::mem::take(&mut result.output));
                (result, code)
            }
        };
        self.depth -= 1;

        if !result.is_success() {
            *self.state = snapshot;
            self.logs.truncate(log_mark);
            return CreateOutcome { result, address: None };
        }

        trace!(%creator, %address, code_len = code.len(), "contract created");
        self.state.set_code(address, code);
        CreateOutcome {
            result,
            address: Some(address),
        }
    }
}

impl Host for Executor<'_> {
    fn block(&self) -> BlockEnv {
        self.env
    }

    fn sload(&mut self, address: &Address, slot: &H256) -> H256 {
        self.state.storage(address, slot)
    }

    fn sstore(&mut self, address: &Address, slot: H256, value: H256) -> H256 {
        self.state.set_storage(*address, slot, value)
    }

    fn emit_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    fn call(&mut self, ctx: CallContext) -> ExecutionResult {
        if self.depth >= MAX_CALL_DEPTH {
            return ExecutionResult::halt(ctx.gas, EvmError::Host("max call depth exceeded".into()));
        }

        let snapshot = self.state.clone();
        let log_mark = self.logs.len();
        if !self.state.transfer(ctx.caller, ctx.address, ctx.value) {
            return ExecutionResult::revert(0, Vec::new());
        }

        let code = self.state.code(&ctx.address);
        if code.is_empty() {
            return ExecutionResult::success(0, Vec::new());
        }

        self.depth += 1;
        let result = self.run(code, &ctx);
        self.depth -= 1;

        if !result.is_success() {
            *self.state = snapshot;
            self.logs.truncate(log_mark);
        }
        result
    }

    fn create(&mut self, creator: Address, init_code: Bytes, gas: u64) -> CreateOutcome {
        if self.depth >= MAX_CALL_DEPTH {
            return CreateOutcome {
                result: ExecutionResult::halt(gas, EvmError::Host("max call depth exceeded".into())),
                address: None,
            };
        }
        let nonce = self.state.increment_nonce(creator);
        let address = create_address(&creator, nonce);
        self.deploy(creator, address, init_code, gas)
    }
}
