//! Contract events
//!
//! Every event has a stable display form, e.g.
//! `Transfer{From: 0x00..00, To: 0x00..01, Value: 100}`. The harness compares
//! expected and emitted events through that form.
//!
//! Address fields are indexed; amounts and strings travel in the log data.

use std::fmt;

use bytes::Bytes;
use rsv_primitives::{Address, H256, U256};
use rsv_sdk::abi::{self, ParamType, Token};
use rsv_types::Log;

use crate::{ContractError, ContractResult};

/// Where an event field travels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Topic,
    Data,
}

/// Wire layout of one event. Indexed fields precede data fields.
#[derive(Clone, Copy, Debug)]
struct Layout {
    signature: &'static str,
    fields: &'static [(ParamKind, Slot)],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParamKind {
    Address,
    Uint,
    String,
}

impl ParamKind {
    fn param_type(self) -> ParamType {
        match self {
            ParamKind::Address => ParamType::Address,
            ParamKind::Uint => ParamType::Uint(256),
            ParamKind::String => ParamType::String,
        }
    }
}

use ParamKind::{Address as A, String as S, Uint as U};
use Slot::{Data, Topic};

impl Layout {
    fn topic0(&self) -> H256 {
        abi::event_signature(self.signature)
    }

    fn encode(&self, address: Address, values: Vec<Token>) -> Log {
        let mut topics = vec![self.topic0()];
        let mut data = Vec::new();
        for ((_, slot), value) in self.fields.iter().zip(values) {
            match slot {
                Topic => topics.push(H256::from_bytes(word_of(&value))),
                Data => data.push(value),
            }
        }
        Log::new(address, topics, Bytes::from(abi::encode(&data)))
    }

    fn decode(&self, log: &Log) -> ContractResult<Fields> {
        let indexed = self.fields.iter().filter(|(_, slot)| *slot == Topic).count();
        if log.topics.len() != indexed + 1 {
            return Err(ContractError::MalformedLog(format!(
                "{} expects {} topics, got {}",
                self.signature,
                indexed + 1,
                log.topics.len()
            )));
        }

        let data_types: Vec<ParamType> = self
            .fields
            .iter()
            .filter(|(_, slot)| *slot == Data)
            .map(|(kind, _)| kind.param_type())
            .collect();
        let mut data = abi::decode(&data_types, &log.data)?.into_iter();
        let mut topics = log.topics[1..].iter();

        let mut values = Vec::with_capacity(self.fields.len());
        for (kind, slot) in self.fields {
            let value = match slot {
                Topic => {
                    let topic = topics
                        .next()
                        .ok_or_else(|| ContractError::MalformedLog("missing topic".into()))?;
                    let mut decoded = abi::decode(&[kind.param_type()], topic.as_bytes())?;
                    decoded.pop()
                }
                Data => data.next(),
            };
            values.push(value.ok_or_else(|| ContractError::MalformedLog("missing field".into()))?);
        }
        Ok(Fields(values.into_iter()))
    }
}

fn word_of(token: &Token) -> [u8; 32] {
    match token {
        Token::Address(address) => address.to_word(),
        Token::Uint(value) => rsv_primitives::u256_to_word(value),
        // Indexed dynamic values are stored as their hash
        other => *rsv_crypto::keccak256(&abi::encode(std::slice::from_ref(other))).as_bytes(),
    }
}

struct Fields(std::vec::IntoIter<Token>);

impl Fields {
    fn next(&mut self) -> ContractResult<Token> {
        self.0
            .next()
            .ok_or_else(|| ContractError::MalformedLog("missing field".into()))
    }

    fn address(&mut self) -> ContractResult<Address> {
        self.next()?
            .into_address()
            .ok_or_else(|| ContractError::MalformedLog("expected address".into()))
    }

    fn uint(&mut self) -> ContractResult<U256> {
        self.next()?
            .into_uint()
            .ok_or_else(|| ContractError::MalformedLog("expected uint256".into()))
    }

    fn string(&mut self) -> ContractResult<String> {
        self.next()?
            .into_string()
            .ok_or_else(|| ContractError::MalformedLog("expected string".into()))
    }
}

// ==================== Reserve ====================

const TRANSFER: Layout = Layout {
    signature: "Transfer(address,address,uint256)",
    fields: &[(A, Topic), (A, Topic), (U, Data)],
};
const APPROVAL: Layout = Layout {
    signature: "Approval(address,address,uint256)",
    fields: &[(A, Topic), (A, Topic), (U, Data)],
};
const MINTER_CHANGED: Layout = Layout {
    signature: "MinterChanged(address)",
    fields: &[(A, Topic)],
};
const PAUSER_CHANGED: Layout = Layout {
    signature: "PauserChanged(address)",
    fields: &[(A, Topic)],
};
const FREEZER_CHANGED: Layout = Layout {
    signature: "FreezerChanged(address)",
    fields: &[(A, Topic)],
};
const PAUSED: Layout = Layout {
    signature: "Paused(address)",
    fields: &[(A, Topic)],
};
const UNPAUSED: Layout = Layout {
    signature: "Unpaused(address)",
    fields: &[(A, Topic)],
};
const NAME_CHANGED: Layout = Layout {
    signature: "NameChanged(string,string)",
    fields: &[(S, Data), (S, Data)],
};
const FROZEN: Layout = Layout {
    signature: "Frozen(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};
const UNFROZEN: Layout = Layout {
    signature: "Unfrozen(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};
const WIPED: Layout = Layout {
    signature: "Wiped(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};
const NEW_OWNER_NOMINATED: Layout = Layout {
    signature: "NewOwnerNominated(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};
const OWNERSHIP_TRANSFERRED: Layout = Layout {
    signature: "OwnershipTransferred(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};
const ETERNAL_STORAGE_TRANSFERRED: Layout = Layout {
    signature: "EternalStorageTransferred(address)",
    fields: &[(A, Topic)],
};

/// Events emitted by `Reserve` and `ReserveV2`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReserveEvent {
    /// Tokens moved; mints come from and burns go to the zero address
    Transfer {
        /// Source
        from: Address,
        /// Destination
        to: Address,
        /// Amount
        value: U256,
    },
    /// Allowance set
    Approval {
        /// Token holder
        holder: Address,
        /// Approved spender
        spender: Address,
        /// New allowance
        value: U256,
    },
    /// Minter role moved
    MinterChanged {
        /// New minter
        new_minter: Address,
    },
    /// Pauser role moved
    PauserChanged {
        /// New pauser
        new_pauser: Address,
    },
    /// Freezer role moved
    FreezerChanged {
        /// New freezer
        new_freezer: Address,
    },
    /// Contract paused
    Paused {
        /// Pauser
        account: Address,
    },
    /// Contract unpaused
    Unpaused {
        /// Pauser
        account: Address,
    },
    /// Name and symbol changed
    NameChanged {
        /// New name
        new_name: String,
        /// New symbol
        new_symbol: String,
    },
    /// Account frozen
    Frozen {
        /// Freezer
        freezer: Address,
        /// Frozen account
        account: Address,
    },
    /// Account unfrozen
    Unfrozen {
        /// Freezer
        freezer: Address,
        /// Unfrozen account
        account: Address,
    },
    /// Frozen account's balance destroyed
    Wiped {
        /// Freezer
        freezer: Address,
        /// Wiped account
        wiped: Address,
    },
    /// Owner nominated a successor
    NewOwnerNominated {
        /// Current owner
        previous_owner: Address,
        /// Nominee
        nominee: Address,
    },
    /// Ownership moved
    OwnershipTransferred {
        /// Old owner
        previous_owner: Address,
        /// New owner, zero after renouncing
        new_owner: Address,
    },
    /// Eternal storage handed to another contract
    EternalStorageTransferred {
        /// Receiving contract
        new_reserve_address: Address,
    },
}

impl ReserveEvent {
    fn layout(&self) -> &'static Layout {
        match self {
            ReserveEvent::Transfer { .. } => &TRANSFER,
            ReserveEvent::Approval { .. } => &APPROVAL,
            ReserveEvent::MinterChanged { .. } => &MINTER_CHANGED,
            ReserveEvent::PauserChanged { .. } => &PAUSER_CHANGED,
            ReserveEvent::FreezerChanged { .. } => &FREEZER_CHANGED,
            ReserveEvent::Paused { .. } => &PAUSED,
            ReserveEvent::Unpaused { .. } => &UNPAUSED,
            ReserveEvent::NameChanged { .. } => &NAME_CHANGED,
            ReserveEvent::Frozen { .. } => &FROZEN,
            ReserveEvent::Unfrozen { .. } => &UNFROZEN,
            ReserveEvent::Wiped { .. } => &WIPED,
            ReserveEvent::NewOwnerNominated { .. } => &NEW_OWNER_NOMINATED,
            ReserveEvent::OwnershipTransferred { .. } => &OWNERSHIP_TRANSFERRED,
            ReserveEvent::EternalStorageTransferred { .. } => &ETERNAL_STORAGE_TRANSFERRED,
        }
    }

    fn values(&self) -> Vec<Token> {
        use Token::Address as Addr;
        match self {
            ReserveEvent::Transfer { from, to, value } => {
                vec![Addr(*from), Addr(*to), Token::Uint(*value)]
            }
            ReserveEvent::Approval {
                holder,
                spender,
                value,
            } => vec![Addr(*holder), Addr(*spender), Token::Uint(*value)],
            ReserveEvent::MinterChanged { new_minter: a }
            | ReserveEvent::PauserChanged { new_pauser: a }
            | ReserveEvent::FreezerChanged { new_freezer: a }
            | ReserveEvent::Paused { account: a }
            | ReserveEvent::Unpaused { account: a }
            | ReserveEvent::EternalStorageTransferred {
                new_reserve_address: a,
            } => vec![Addr(*a)],
            ReserveEvent::NameChanged {
                new_name,
                new_symbol,
            } => vec![Token::String(new_name.clone()), Token::String(new_symbol.clone())],
            ReserveEvent::Frozen { freezer: a, account: b }
            | ReserveEvent::Unfrozen { freezer: a, account: b }
            | ReserveEvent::Wiped { freezer: a, wiped: b }
            | ReserveEvent::NewOwnerNominated {
                previous_owner: a,
                nominee: b,
            }
            | ReserveEvent::OwnershipTransferred {
                previous_owner: a,
                new_owner: b,
            } => vec![Addr(*a), Addr(*b)],
        }
    }

    /// Event signature, e.g. `Transfer(address,address,uint256)`
    pub fn signature(&self) -> &'static str {
        self.layout().signature
    }

    /// Encode as a log emitted by `address`
    pub fn to_log(&self, address: Address) -> Log {
        self.layout().encode(address, self.values())
    }

    /// Decode a log emitted by a Reserve contract
    pub fn decode(log: &Log) -> ContractResult<Self> {
        let topic0 = log
            .topic0()
            .ok_or_else(|| ContractError::MalformedLog("anonymous log".into()))?;

        let layouts: [&Layout; 14] = [
            &TRANSFER,
            &APPROVAL,
            &MINTER_CHANGED,
            &PAUSER_CHANGED,
            &FREEZER_CHANGED,
            &PAUSED,
            &UNPAUSED,
            &NAME_CHANGED,
            &FROZEN,
            &UNFROZEN,
            &WIPED,
            &NEW_OWNER_NOMINATED,
            &OWNERSHIP_TRANSFERRED,
            &ETERNAL_STORAGE_TRANSFERRED,
        ];
        let layout = layouts
            .into_iter()
            .find(|layout| layout.topic0() == *topic0)
            .ok_or(ContractError::UnknownEvent(*topic0))?;
        let mut f = layout.decode(log)?;

        let event = match layout.signature {
            s if s == TRANSFER.signature => ReserveEvent::Transfer {
                from: f.address()?,
                to: f.address()?,
                value: f.uint()?,
            },
            s if s == APPROVAL.signature => ReserveEvent::Approval {
                holder: f.address()?,
                spender: f.address()?,
                value: f.uint()?,
            },
            s if s == MINTER_CHANGED.signature => ReserveEvent::MinterChanged {
                new_minter: f.address()?,
            },
            s if s == PAUSER_CHANGED.signature => ReserveEvent::PauserChanged {
                new_pauser: f.address()?,
            },
            s if s == FREEZER_CHANGED.signature => ReserveEvent::FreezerChanged {
                new_freezer: f.address()?,
            },
            s if s == PAUSED.signature => ReserveEvent::Paused {
                account: f.address()?,
            },
            s if s == UNPAUSED.signature => ReserveEvent::Unpaused {
                account: f.address()?,
            },
            s if s == NAME_CHANGED.signature => ReserveEvent::NameChanged {
                new_name: f.string()?,
                new_symbol: f.string()?,
            },
            s if s == FROZEN.signature => ReserveEvent::Frozen {
                freezer: f.address()?,
                account: f.address()?,
            },
            s if s == UNFROZEN.signature => ReserveEvent::Unfrozen {
                freezer: f.address()?,
                account: f.address()?,
            },
            s if s == WIPED.signature => ReserveEvent::Wiped {
                freezer: f.address()?,
                wiped: f.address()?,
            },
            s if s == NEW_OWNER_NOMINATED.signature => ReserveEvent::NewOwnerNominated {
                previous_owner: f.address()?,
                nominee: f.address()?,
            },
            s if s == OWNERSHIP_TRANSFERRED.signature => ReserveEvent::OwnershipTransferred {
                previous_owner: f.address()?,
                new_owner: f.address()?,
            },
            _ => ReserveEvent::EternalStorageTransferred {
                new_reserve_address: f.address()?,
            },
        };
        Ok(event)
    }
}

impl fmt::Display for ReserveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReserveEvent::Transfer { from, to, value } => {
                write!(f, "Transfer{{From: {}, To: {}, Value: {}}}", from, to, value)
            }
            ReserveEvent::Approval {
                holder,
                spender,
                value,
            } => write!(
                f,
                "Approval{{Holder: {}, Spender: {}, Value: {}}}",
                holder, spender, value
            ),
            ReserveEvent::MinterChanged { new_minter } => {
                write!(f, "MinterChanged{{NewMinter: {}}}", new_minter)
            }
            ReserveEvent::PauserChanged { new_pauser } => {
                write!(f, "PauserChanged{{NewPauser: {}}}", new_pauser)
            }
            ReserveEvent::FreezerChanged { new_freezer } => {
                write!(f, "FreezerChanged{{NewFreezer: {}}}", new_freezer)
            }
            ReserveEvent::Paused { account } => write!(f, "Paused{{Account: {}}}", account),
            ReserveEvent::Unpaused { account } => write!(f, "Unpaused{{Account: {}}}", account),
            ReserveEvent::NameChanged {
                new_name,
                new_symbol,
            } => write!(
                f,
                "NameChanged{{NewName: {:?}, NewSymbol: {:?}}}",
                new_name, new_symbol
            ),
            ReserveEvent::Frozen { freezer, account } => {
                write!(f, "Frozen{{Freezer: {}, Account: {}}}", freezer, account)
            }
            ReserveEvent::Unfrozen { freezer, account } => {
                write!(f, "Unfrozen{{Freezer: {}, Account: {}}}", freezer, account)
            }
            ReserveEvent::Wiped { freezer, wiped } => {
                write!(f, "Wiped{{Freezer: {}, Wiped: {}}}", freezer, wiped)
            }
            ReserveEvent::NewOwnerNominated {
                previous_owner,
                nominee,
            } => write!(
                f,
                "NewOwnerNominated{{PreviousOwner: {}, Nominee: {}}}",
                previous_owner, nominee
            ),
            ReserveEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => write!(
                f,
                "OwnershipTransferred{{PreviousOwner: {}, NewOwner: {}}}",
                previous_owner, new_owner
            ),
            ReserveEvent::EternalStorageTransferred {
                new_reserve_address,
            } => write!(
                f,
                "EternalStorageTransferred{{NewReserveAddress: {}}}",
                new_reserve_address
            ),
        }
    }
}

// ==================== Eternal storage ====================

const STORAGE_OWNERSHIP_TRANSFERRED: Layout = Layout {
    signature: "OwnershipTransferred(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};
const ESCAPE_HATCH_TRANSFERRED: Layout = Layout {
    signature: "EscapeHatchTransferred(address,address)",
    fields: &[(A, Topic), (A, Topic)],
};

/// Events emitted by `ReserveEternalStorage`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EternalStorageEvent {
    /// Ownership moved, by the owner or through the escape hatch
    OwnershipTransferred {
        /// Old owner
        old_owner: Address,
        /// New owner
        new_owner: Address,
    },
    /// Escape hatch moved
    EscapeHatchTransferred {
        /// Old escape hatch
        old_escape_hatch: Address,
        /// New escape hatch
        new_escape_hatch: Address,
    },
}

impl EternalStorageEvent {
    fn layout(&self) -> &'static Layout {
        match self {
            EternalStorageEvent::OwnershipTransferred { .. } => &STORAGE_OWNERSHIP_TRANSFERRED,
            EternalStorageEvent::EscapeHatchTransferred { .. } => &ESCAPE_HATCH_TRANSFERRED,
        }
    }

    /// Event signature
    pub fn signature(&self) -> &'static str {
        self.layout().signature
    }

    /// Encode as a log emitted by `address`
    pub fn to_log(&self, address: Address) -> Log {
        let (a, b) = match self {
            EternalStorageEvent::OwnershipTransferred {
                old_owner,
                new_owner,
            } => (old_owner, new_owner),
            EternalStorageEvent::EscapeHatchTransferred {
                old_escape_hatch,
                new_escape_hatch,
            } => (old_escape_hatch, new_escape_hatch),
        };
        self.layout()
            .encode(address, vec![Token::Address(*a), Token::Address(*b)])
    }

    /// Decode a log emitted by an eternal storage contract
    pub fn decode(log: &Log) -> ContractResult<Self> {
        let topic0 = log
            .topic0()
            .ok_or_else(|| ContractError::MalformedLog("anonymous log".into()))?;

        if *topic0 == STORAGE_OWNERSHIP_TRANSFERRED.topic0() {
            let mut f = STORAGE_OWNERSHIP_TRANSFERRED.decode(log)?;
            Ok(EternalStorageEvent::OwnershipTransferred {
                old_owner: f.address()?,
                new_owner: f.address()?,
            })
        } else if *topic0 == ESCAPE_HATCH_TRANSFERRED.topic0() {
            let mut f = ESCAPE_HATCH_TRANSFERRED.decode(log)?;
            Ok(EternalStorageEvent::EscapeHatchTransferred {
                old_escape_hatch: f.address()?,
                new_escape_hatch: f.address()?,
            })
        } else {
            Err(ContractError::UnknownEvent(*topic0))
        }
    }
}

impl fmt::Display for EternalStorageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EternalStorageEvent::OwnershipTransferred {
                old_owner,
                new_owner,
            } => write!(
                f,
                "OwnershipTransferred{{OldOwner: {}, NewOwner: {}}}",
                old_owner, new_owner
            ),
            EternalStorageEvent::EscapeHatchTransferred {
                old_escape_hatch,
                new_escape_hatch,
            } => write!(
                f,
                "EscapeHatchTransferred{{OldEscapeHatch: {}, NewEscapeHatch: {}}}",
                old_escape_hatch, new_escape_hatch
            ),
        }
    }
}

// ==================== Any contract ====================

/// An event from any contract in the family
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// From `Reserve` or `ReserveV2`
    Reserve(ReserveEvent),
    /// From `ReserveEternalStorage`
    EternalStorage(EternalStorageEvent),
}

impl Event {
    /// Encode as a log emitted by `address`
    pub fn to_log(&self, address: Address) -> Log {
        match self {
            Event::Reserve(event) => event.to_log(address),
            Event::EternalStorage(event) => event.to_log(address),
        }
    }
}

impl From<ReserveEvent> for Event {
    fn from(event: ReserveEvent) -> Self {
        Event::Reserve(event)
    }
}

impl From<EternalStorageEvent> for Event {
    fn from(event: EternalStorageEvent) -> Self {
        Event::EternalStorage(event)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Reserve(event) => event.fmt(f),
            Event::EternalStorage(event) => event.fmt(f),
        }
    }
}
