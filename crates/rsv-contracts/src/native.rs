//! Native execution frames
//!
//! A [`NativeFrame`] is the native counterpart of an interpreter frame: it
//! meters gas, reads and writes the contract's storage, emits logs and makes
//! nested calls, all through the ledger's [`Host`].

use bytes::Bytes;
use rsv_evm::{gas, opcode, BlockEnv, CallContext, EvmError, ExecutionResult, Host};
use rsv_primitives::{Address, H256, U256};
use rsv_sdk::abi::Token;
use tracing::debug;

use crate::abi::Function;
use crate::artifacts::Artifact;
use crate::events::Event;
use crate::storage::StorageAccess;
use crate::{decode_revert_reason, encode_revert_reason, eternal_storage, reserve};
use crate::{ContractError, ContractResult};

/// Flat cost of entering a nested frame
const CALL_GAS: u64 = 700;

/// Flat cost of a nested creation
const CREATE_GAS: u64 = 32_000;

/// Execution frame of a native contract
pub struct NativeFrame<'h> {
    host: &'h mut dyn Host,
    address: Address,
    caller: Address,
    gas_limit: u64,
    gas_used: u64,
    is_static: bool,
}

impl<'h> NativeFrame<'h> {
    /// Frame for `ctx` on `host`
    pub fn new(host: &'h mut dyn Host, ctx: &CallContext) -> Self {
        Self {
            host,
            address: ctx.address,
            caller: ctx.caller,
            gas_limit: ctx.gas,
            gas_used: 0,
            is_static: ctx.is_static,
        }
    }

    /// Executing contract
    pub fn address(&self) -> Address {
        self.address
    }

    /// `msg.sender`
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Current block
    pub fn block(&self) -> BlockEnv {
        self.host.block()
    }

    /// Gas consumed so far
    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    fn remaining(&self) -> u64 {
        self.gas_limit - self.gas_used
    }

    fn charge(&mut self, amount: u64) -> ContractResult<()> {
        if amount > self.remaining() {
            self.gas_used = self.gas_limit;
            return Err(ContractError::OutOfGas);
        }
        self.gas_used += amount;
        Ok(())
    }

    fn ensure_mutable(&self) -> ContractResult<()> {
        if self.is_static {
            return Err(ContractError::StaticCall);
        }
        Ok(())
    }

    /// Emit `event` from this contract
    pub fn emit(&mut self, event: impl Into<Event>) -> ContractResult<()> {
        self.ensure_mutable()?;
        let log = event.into().to_log(self.address);
        let topics = log.topics.len() as u8;
        self.charge(gas::static_gas(opcode::LOG0 + topics) + gas::log_data_gas(log.data.len()))?;
        self.host.emit_log(log);
        Ok(())
    }

    /// Call `function` on `target` and decode its return values.
    ///
    /// A failed callee fails this frame too.
    pub fn call(&mut self, target: Address, function: &Function, args: &[Token]) -> ContractResult<Vec<Token>> {
        self.charge(CALL_GAS)?;
        let data = function.encode_input(args)?;
        let ctx = CallContext {
            address: target,
            caller: self.address,
            value: 0,
            data: Bytes::from(data),
            gas: self.remaining(),
            is_static: self.is_static,
        };

        let result = self.host.call(ctx);
        self.charge(result.gas_used)?;
        if !result.is_success() {
            let reason = decode_revert_reason(&result.output)
                .unwrap_or_else(|| format!("call to {} failed", function.name));
            return Err(ContractError::Revert(reason));
        }
        function.decode_output(&result.output)
    }

    /// Deploy `init_code` from this contract
    pub fn create(&mut self, init_code: Vec<u8>) -> ContractResult<Address> {
        self.ensure_mutable()?;
        self.charge(CREATE_GAS)?;
        let outcome = self
            .host
            .create(self.address, Bytes::from(init_code), self.remaining());
        self.charge(outcome.result.gas_used)?;
        outcome
            .address
            .filter(|_| outcome.result.is_success())
            .ok_or_else(|| ContractError::Revert("contract creation failed".into()))
    }

    fn finish(self, outcome: ContractResult<Vec<u8>>, artifact: Artifact) -> ExecutionResult {
        match outcome {
            Ok(output) => ExecutionResult::success(self.gas_used, output),
            Err(ContractError::OutOfGas) => ExecutionResult::halt(self.gas_limit, EvmError::OutOfGas),
            Err(ContractError::StaticCall) => {
                ExecutionResult::halt(self.gas_limit, EvmError::StaticCallViolation)
            }
            Err(err) => {
                let reason = match err {
                    ContractError::Revert(reason) => reason,
                    other => other.to_string(),
                };
                debug!(contract = artifact.name(), address = %self.address, %reason, "native call reverted");
                ExecutionResult::revert(self.gas_used, encode_revert_reason(&reason))
            }
        }
    }
}

impl StorageAccess for NativeFrame<'_> {
    fn load(&mut self, slot: &H256) -> ContractResult<H256> {
        self.charge(gas::static_gas(opcode::SLOAD))?;
        Ok(self.host.sload(&self.address, slot))
    }

    fn store(&mut self, slot: H256, value: H256) -> ContractResult<()> {
        self.ensure_mutable()?;
        let current = self.host.sload(&self.address, &slot);
        self.charge(gas::sstore_gas(current.is_zero(), value.is_zero()))?;
        self.host.sstore(&self.address, slot, value);
        Ok(())
    }
}

/// Decoded call arguments, consumed in order
pub(crate) struct Args(std::vec::IntoIter<Token>);

impl Args {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self(tokens.into_iter())
    }

    fn next(&mut self) -> ContractResult<Token> {
        self.0
            .next()
            .ok_or_else(|| ContractError::Abi("missing argument".into()))
    }

    pub(crate) fn address(&mut self) -> ContractResult<Address> {
        self.next()?
            .into_address()
            .ok_or_else(|| ContractError::Abi("expected address".into()))
    }

    pub(crate) fn uint(&mut self) -> ContractResult<U256> {
        self.next()?
            .into_uint()
            .ok_or_else(|| ContractError::Abi("expected uint256".into()))
    }

    pub(crate) fn string(&mut self) -> ContractResult<String> {
        self.next()?
            .into_string()
            .ok_or_else(|| ContractError::Abi("expected string".into()))
    }
}

/// Fail the frame with `reason` unless `condition` holds
pub(crate) fn require(condition: bool, reason: &str) -> ContractResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ContractError::Revert(reason.to_string()))
    }
}

/// Run a message call against a deployed native contract
pub fn execute(host: &mut dyn Host, ctx: &CallContext, artifact: Artifact) -> ExecutionResult {
    let mut frame = NativeFrame::new(host, ctx);
    let outcome = dispatch(&mut frame, ctx, artifact);
    frame.finish(outcome, artifact)
}

fn dispatch(frame: &mut NativeFrame<'_>, ctx: &CallContext, artifact: Artifact) -> ContractResult<Vec<u8>> {
    let Some(selector) = ctx.data.get(..4) else {
        return Err(ContractError::Revert("missing function selector".into()));
    };
    let mut raw = [0u8; 4];
    raw.copy_from_slice(selector);

    let function = artifact
        .abi()
        .by_selector(raw)
        .ok_or(ContractError::UnknownSelector(raw))?;
    require(ctx.value == 0, "function is not payable")?;
    let args = Args::new(function.decode_input(&ctx.data[4..])?);

    let output = match artifact {
        Artifact::Reserve | Artifact::ReserveV2 => reserve::call(frame, &function.name, args)?,
        Artifact::EternalStorage => eternal_storage::call(frame, &function.name, args)?,
    };
    function.encode_output(&output)
}

/// Run the constructor of `artifact` with encoded `args`.
///
/// `ctx.address` is the new contract's address.
pub fn construct(host: &mut dyn Host, ctx: &CallContext, artifact: Artifact, args: &[u8]) -> ExecutionResult {
    let mut frame = NativeFrame::new(host, ctx);
    let outcome = rsv_sdk::abi::decode(artifact.abi().constructor(), args)
        .map_err(ContractError::from)
        .and_then(|tokens| {
            let args = Args::new(tokens);
            match artifact {
                Artifact::Reserve | Artifact::ReserveV2 => reserve::construct(&mut frame, args),
                Artifact::EternalStorage => eternal_storage::construct(&mut frame, args),
            }
        })
        .map(|()| Vec::new());
    frame.finish(outcome, artifact)
}
