//! ABI decoding

use rsv_primitives::{Address, U256};

use super::types::{ParamType, Token};
use crate::{SdkError, SdkResult};

/// Decode `data` as a parameter list of `types`
pub fn decode(types: &[ParamType], data: &[u8]) -> SdkResult<Vec<Token>> {
    decode_params(types, data, 0)
}

fn decode_params(types: &[ParamType], data: &[u8], base: usize) -> SdkResult<Vec<Token>> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = base;
    for param_type in types {
        let (token, consumed) = decode_at(param_type, data, base, head)?;
        tokens.push(token);
        head += consumed;
    }
    Ok(tokens)
}

/// Decode one value whose head slot is at `head`; offsets are relative to `base`
fn decode_at(
    param_type: &ParamType,
    data: &[u8],
    base: usize,
    head: usize,
) -> SdkResult<(Token, usize)> {
    if param_type.is_dynamic() {
        let offset = base + read_usize(data, head)?;
        return Ok((decode_tail(param_type, data, offset)?, 32));
    }
    match param_type {
        ParamType::Address => {
            let word = read_word(data, head)?;
            Ok((Token::Address(Address::from_word(word)), 32))
        }
        ParamType::Uint(_) => Ok((Token::Uint(U256::from_big_endian(read_word(data, head)?)), 32)),
        ParamType::Bool => {
            let value = U256::from_big_endian(read_word(data, head)?);
            if value > U256::one() {
                return Err(SdkError::AbiDecode(format!("invalid bool: {}", value)));
            }
            Ok((Token::Bool(!value.is_zero()), 32))
        }
        ParamType::FixedBytes(n) => {
            let word = read_word(data, head)?;
            Ok((Token::FixedBytes(word[..*n].to_vec()), 32))
        }
        ParamType::Tuple(types) => {
            let tokens = decode_params(types, data, head)?;
            Ok((Token::Tuple(tokens), param_type.head_size()))
        }
        _ => Err(SdkError::AbiDecode(format!(
            "unexpected dynamic type {}",
            param_type.canonical()
        ))),
    }
}

fn decode_tail(param_type: &ParamType, data: &[u8], offset: usize) -> SdkResult<Token> {
    match param_type {
        ParamType::Bytes => Ok(Token::Bytes(read_bytes(data, offset)?)),
        ParamType::String => {
            let bytes = read_bytes(data, offset)?;
            String::from_utf8(bytes)
                .map(Token::String)
                .map_err(|e| SdkError::AbiDecode(format!("invalid utf-8: {}", e)))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, offset)?;
            let types = vec![(**inner).clone(); len];
            decode_params(&types, data, offset + 32).map(Token::Array)
        }
        ParamType::Tuple(types) => decode_params(types, data, offset).map(Token::Tuple),
        other => Err(SdkError::AbiDecode(format!(
            "unexpected static type {}",
            other.canonical()
        ))),
    }
}

fn read_word(data: &[u8], at: usize) -> SdkResult<&[u8; 32]> {
    let end = at
        .checked_add(32)
        .ok_or_else(|| SdkError::AbiDecode("offset overflow".into()))?;
    let slice = data.get(at..end).ok_or_else(|| {
        SdkError::AbiDecode(format!("need {} bytes, have {}", end, data.len()))
    })?;
    slice
        .try_into()
        .map_err(|_| SdkError::AbiDecode("short word".into()))
}

fn read_usize(data: &[u8], at: usize) -> SdkResult<usize> {
    let value = U256::from_big_endian(read_word(data, at)?);
    if value > U256::from(data.len()) {
        return Err(SdkError::AbiDecode(format!("offset or length {} out of range", value)));
    }
    Ok(value.as_usize())
}

fn read_bytes(data: &[u8], offset: usize) -> SdkResult<Vec<u8>> {
    let len = read_usize(data, offset)?;
    let start = offset + 32;
    data.get(start..start + len)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| SdkError::AbiDecode(format!("need {} bytes, have {}", start + len, data.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode;

    #[test]
    fn test_decode_uint_and_address() {
        let mut data = vec![0u8; 64];
        data[31] = 42;
        data[63] = 1;
        let tokens = decode(&[ParamType::Uint(256), ParamType::Address], &data).unwrap();
        assert_eq!(tokens[0], Token::Uint(U256::from(42)));
        assert_eq!(tokens[1], Token::Address(Address::from_low_u64(1)));
    }

    #[test]
    fn test_decode_strings() {
        let data = encode(&[Token::String("Reserve".into()), Token::String("RSV".into())]);
        let tokens = decode(&[ParamType::String, ParamType::String], &data).unwrap();
        assert_eq!(tokens, vec![Token::String("Reserve".into()), Token::String("RSV".into())]);
    }

    #[test]
    fn test_decode_nested_dynamic_tuple() {
        let value = Token::Tuple(vec![
            Token::Uint(U256::from(7)),
            Token::Array(vec![Token::Address(Address::from_low_u64(3))]),
        ]);
        let data = encode(&[value.clone(), Token::Bool(true)]);
        let types = vec![
            ParamType::Tuple(vec![
                ParamType::Uint(256),
                ParamType::Array(Box::new(ParamType::Address)),
            ]),
            ParamType::Bool,
        ];
        assert_eq!(decode(&types, &data).unwrap(), vec![value, Token::Bool(true)]);
    }

    #[test]
    fn test_decode_short_data() {
        assert!(decode(&[ParamType::Uint(256)], &[0u8; 31]).is_err());
    }

    #[test]
    fn test_decode_rejects_huge_offset() {
        let mut data = vec![0xffu8; 32];
        data.extend([0u8; 32]);
        assert!(decode(&[ParamType::String], &data).is_err());
    }

    #[test]
    fn test_decode_rejects_non_boolean() {
        let mut data = vec![0u8; 32];
        data[31] = 2;
        assert!(decode(&[ParamType::Bool], &data).is_err());
    }
}
