//! # rsv-evm
//!
//! Execution engine for the simulated ledger.
//!
//! - [`Interpreter`]: runs EVM bytecode for compiled contracts that need
//!   no external calls
//! - [`Host`]: the seam between executing code and ledger state. The
//!   interpreter and the native contract implementations both run against it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub mod gas;
mod host;
mod interpreter;
mod memory;
pub mod opcode;
mod stack;

pub use error::{EvmError, EvmResult, ExecutionResult, ExitReason};
pub use host::{BlockEnv, CallContext, CreateOutcome, Host};
pub use interpreter::Interpreter;
pub use memory::Memory;
pub use stack::{Stack, STACK_LIMIT};
