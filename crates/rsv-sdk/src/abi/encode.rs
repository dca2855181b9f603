//! ABI encoding

use rsv_crypto::keccak256;
use rsv_primitives::{u256_to_word, H256, U256};

use super::types::{ParamType, Token};
use crate::{SdkError, SdkResult};

/// Encode a parameter list with head/tail layout
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_size: usize = tokens.iter().map(|t| t.type_of().head_size()).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        if token.type_of().is_dynamic() {
            head.extend_from_slice(&u256_to_word(&U256::from(head_size + tail.len())));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }

    head.extend(tail);
    head
}

/// Selector followed by encoded arguments
pub fn encode_function_call(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
    let mut out = selector.to_vec();
    out.extend(encode(tokens));
    out
}

/// First four bytes of keccak(signature)
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Topic 0 of an event
pub fn event_signature(signature: &str) -> H256 {
    keccak256(signature.as_bytes())
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(addr) => addr.to_word().to_vec(),
        Token::Uint(value) => u256_to_word(value).to_vec(),
        Token::Bool(b) => u256_to_word(&U256::from(*b as u8)).to_vec(),
        Token::FixedBytes(data) => {
            let mut word = [0u8; 32];
            let len = data.len().min(32);
            word[..len].copy_from_slice(&data[..len]);
            word.to_vec()
        }
        Token::Bytes(data) => encode_bytes(data),
        Token::String(s) => encode_bytes(s.as_bytes()),
        Token::Array(items) => {
            let mut out = u256_to_word(&U256::from(items.len())).to_vec();
            out.extend(encode(items));
            out
        }
        Token::Tuple(items) => encode(items),
    }
}

fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = u256_to_word(&U256::from(data.len())).to_vec();
    out.extend_from_slice(data);
    out.resize(32 + data.len().div_ceil(32) * 32, 0);
    out
}

/// Parse a Solidity type name such as `uint256`, `address[]` or `(bool,string)`
pub fn parse_type(s: &str) -> SdkResult<ParamType> {
    let s = s.trim();
    if let Some(inner) = s.strip_suffix("[]") {
        return Ok(ParamType::Array(Box::new(parse_type(inner)?)));
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        return split_tuple(inner)?
            .into_iter()
            .map(parse_type)
            .collect::<SdkResult<Vec<_>>>()
            .map(ParamType::Tuple);
    }
    match s {
        "address" => Ok(ParamType::Address),
        "bool" => Ok(ParamType::Bool),
        "string" => Ok(ParamType::String),
        "bytes" => Ok(ParamType::Bytes),
        "uint" => Ok(ParamType::Uint(256)),
        _ => {
            if let Some(bits) = s.strip_prefix("uint") {
                let bits: usize = bits
                    .parse()
                    .map_err(|_| SdkError::AbiEncode(format!("unknown type: {}", s)))?;
                if bits == 0 || bits > 256 || bits % 8 != 0 {
                    return Err(SdkError::AbiEncode(format!("invalid uint width: {}", s)));
                }
                Ok(ParamType::Uint(bits))
            } else if let Some(n) = s.strip_prefix("bytes") {
                let n: usize = n
                    .parse()
                    .map_err(|_| SdkError::AbiEncode(format!("unknown type: {}", s)))?;
                if n == 0 || n > 32 {
                    return Err(SdkError::AbiEncode(format!("invalid bytes width: {}", s)));
                }
                Ok(ParamType::FixedBytes(n))
            } else {
                Err(SdkError::AbiEncode(format!("unknown type: {}", s)))
            }
        }
    }
}

fn split_tuple(inner: &str) -> SdkResult<Vec<&str>> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err(SdkError::AbiEncode(format!("unbalanced tuple: ({})", inner)));
        }
    }
    if depth != 0 {
        return Err(SdkError::AbiEncode(format!("unbalanced tuple: ({})", inner)));
    }
    parts.push(&inner[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsv_primitives::Address;

    #[test]
    fn test_selectors() {
        assert_eq!(function_selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(function_selector("time()"), [0x16, 0xad, 0xa5, 0x47]);
    }

    #[test]
    fn test_encode_static_args() {
        let data = encode(&[
            Token::Address(Address::from_low_u64(0xff)),
            Token::Uint(U256::from(10)),
            Token::Bool(true),
        ]);
        assert_eq!(data.len(), 96);
        assert_eq!(data[31], 0xff);
        assert_eq!(data[63], 10);
        assert_eq!(data[95], 1);
    }

    #[test]
    fn test_encode_string_uses_tail() {
        let data = encode(&[Token::String("Reserve".into()), Token::String("RSV".into())]);
        // two offsets, then (len, data) for each string
        assert_eq!(data.len(), 64 + 64 + 64);
        assert_eq!(U256::from_big_endian(&data[0..32]), U256::from(64));
        assert_eq!(U256::from_big_endian(&data[32..64]), U256::from(128));
        assert_eq!(U256::from_big_endian(&data[64..96]), U256::from(7));
        assert_eq!(&data[96..103], b"Reserve");
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("uint256").unwrap(), ParamType::Uint(256));
        assert_eq!(parse_type("bytes32").unwrap(), ParamType::FixedBytes(32));
        assert_eq!(
            parse_type("address[]").unwrap(),
            ParamType::Array(Box::new(ParamType::Address))
        );
        assert_eq!(
            parse_type("(bool,(string,uint8))").unwrap(),
            ParamType::Tuple(vec![
                ParamType::Bool,
                ParamType::Tuple(vec![ParamType::String, ParamType::Uint(8)]),
            ])
        );
        assert!(parse_type("uint7").is_err());
        assert!(parse_type("bytes33").is_err());
        assert!(parse_type("int256").is_err());
    }
}
