//! Log parsers keyed by emitting contract
//!
//! A receipt's logs are decoded by whichever parser is registered for the
//! log's address. Expected events are compared to decoded ones through their
//! display forms.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rsv_contracts::Event;
use rsv_primitives::Address;
use rsv_types::Log;

use crate::{HarnessError, HarnessResult};

/// Decodes the logs of one contract
pub trait LogParser: Send + Sync {
    /// Decode `log` into a typed event
    fn parse_log(&self, log: &Log) -> HarnessResult<Event>;
}

/// Emitting address -> parser
#[derive(Clone, Default)]
pub struct LogParserRegistry {
    parsers: HashMap<Address, Arc<dyn LogParser>>,
}

impl LogParserRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode logs from `address` with `parser`, replacing any earlier one
    pub fn register(&mut self, address: Address, parser: impl LogParser + 'static) {
        self.parsers.insert(address, Arc::new(parser));
    }

    /// Drop every parser
    pub fn clear(&mut self) {
        self.parsers.clear();
    }

    /// Whether `address` has a parser
    pub fn contains(&self, address: &Address) -> bool {
        self.parsers.contains_key(address)
    }

    /// Decode `log` with the parser of its emitter
    pub fn parse(&self, log: &Log) -> HarnessResult<Event> {
        self.parsers
            .get(&log.address)
            .ok_or(HarnessError::UnknownEmitter(log.address))?
            .parse_log(log)
    }
}

impl fmt::Debug for LogParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.parsers.keys()).finish()
    }
}

/// Every expected event appears somewhere in `logs`.
///
/// Order is ignored and each expected event is checked on its own, so two
/// equal expectations are both satisfied by one matching log. Logs that
/// have no parser or fail to decode never match.
pub fn check_at_least_events(registry: &LogParserRegistry, logs: &[Log], expected: &[Event]) -> HarnessResult<()> {
    let got: Vec<String> = logs
        .iter()
        .filter_map(|log| registry.parse(log).ok())
        .map(|event| event.to_string())
        .collect();

    let missing: Vec<String> = expected
        .iter()
        .map(|event| event.to_string())
        .filter(|want| !got.contains(want))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Assertion(format!("event not found: {}", missing.join(", "))))
    }
}

/// `logs` decode to exactly `expected`, position by position
pub fn check_strict_events(registry: &LogParserRegistry, logs: &[Log], expected: &[Event]) -> HarnessResult<()> {
    if logs.len() != expected.len() {
        return Err(HarnessError::Assertion(format!(
            "did not get the expected number of events: expected {}, got {}",
            expected.len(),
            logs.len()
        )));
    }

    for (i, (log, want)) in logs.iter().zip(expected).enumerate() {
        let got = match registry.parse(log) {
            Ok(event) => event,
            Err(e @ HarnessError::UnknownEmitter(_)) => return Err(e),
            Err(e) => return Err(HarnessError::Assertion(format!("parsing event {}: {}", i, e))),
        };
        if got.to_string() != want.to_string() {
            return Err(HarnessError::Assertion(format!(
                "event {}: expected {}, got {}",
                i, want, got
            )));
        }
    }
    Ok(())
}
