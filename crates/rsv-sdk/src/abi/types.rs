//! ABI value and type model

use rsv_primitives::{Address, U256};

/// Decoded or to-be-encoded ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// address
    Address(Address),
    /// uintN
    Uint(U256),
    /// bool
    Bool(bool),
    /// bytes
    Bytes(Vec<u8>),
    /// bytesN
    FixedBytes(Vec<u8>),
    /// string
    String(String),
    /// T[]
    Array(Vec<Token>),
    /// (T1,T2,...)
    Tuple(Vec<Token>),
}

/// ABI parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// address
    Address,
    /// uintN with bit width
    Uint(usize),
    /// bool
    Bool,
    /// bytes
    Bytes,
    /// bytesN with byte width
    FixedBytes(usize),
    /// string
    String,
    /// T[]
    Array(Box<ParamType>),
    /// (T1,T2,...)
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Whether values of this type live in the tail
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::Tuple(types) => types.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of an enclosing list
    pub fn head_size(&self) -> usize {
        match self {
            ParamType::Tuple(types) if !self.is_dynamic() => {
                types.iter().map(ParamType::head_size).sum()
            }
            _ => 32,
        }
    }

    /// Canonical name used in signatures
    pub fn canonical(&self) -> String {
        match self {
            ParamType::Address => "address".into(),
            ParamType::Uint(bits) => format!("uint{}", bits),
            ParamType::Bool => "bool".into(),
            ParamType::Bytes => "bytes".into(),
            ParamType::FixedBytes(n) => format!("bytes{}", n),
            ParamType::String => "string".into(),
            ParamType::Array(inner) => format!("{}[]", inner.canonical()),
            ParamType::Tuple(types) => {
                let inner: Vec<String> = types.iter().map(ParamType::canonical).collect();
                format!("({})", inner.join(","))
            }
        }
    }
}

impl Token {
    /// Type this token encodes as
    pub fn type_of(&self) -> ParamType {
        match self {
            Token::Address(_) => ParamType::Address,
            Token::Uint(_) => ParamType::Uint(256),
            Token::Bool(_) => ParamType::Bool,
            Token::Bytes(_) => ParamType::Bytes,
            Token::FixedBytes(b) => ParamType::FixedBytes(b.len()),
            Token::String(_) => ParamType::String,
            Token::Array(tokens) => {
                let inner = tokens.first().map(Token::type_of).unwrap_or(ParamType::Uint(256));
                ParamType::Array(Box::new(inner))
            }
            Token::Tuple(tokens) => ParamType::Tuple(tokens.iter().map(Token::type_of).collect()),
        }
    }

    /// Address value, if this is an address
    pub fn into_address(self) -> Option<Address> {
        match self {
            Token::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Integer value, if this is a uint
    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean value, if this is a bool
    pub fn into_bool(self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// String value, if this is a string
    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }
}
