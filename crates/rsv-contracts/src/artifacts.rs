//! Deployable artifacts
//!
//! Native contracts deploy from init code of the form
//! `0xef ++ artifact id (4 bytes) ++ abi-encoded constructor args`.
//! The `0xef` lead byte is reserved by EIP-3541, so no compiled contract can
//! collide with it. A deployed native contract's code is `0xef ++ id`.

use rsv_sdk::abi::{self, Token};

use crate::abi::{eternal_storage_abi, reserve_abi, Abi};
use crate::{ContractError, ContractResult};

/// Lead byte of native code
pub const NATIVE_PREFIX: u8 = 0xef;

/// Native contract kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// The Reserve token
    Reserve,
    /// Upgrade target of the Reserve token
    ReserveV2,
    /// Balance and allowance store
    EternalStorage,
}

impl Artifact {
    /// Every native artifact
    pub const ALL: [Artifact; 3] = [Artifact::Reserve, Artifact::ReserveV2, Artifact::EternalStorage];

    /// Four-byte id embedded in code
    pub const fn id(&self) -> [u8; 4] {
        match self {
            Artifact::Reserve => *b"RSV1",
            Artifact::ReserveV2 => *b"RSV2",
            Artifact::EternalStorage => *b"RES1",
        }
    }

    /// Artifact for an id
    pub fn from_id(id: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|artifact| artifact.id() == id)
    }

    /// Contract name
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::Reserve => "Reserve",
            Artifact::ReserveV2 => "ReserveV2",
            Artifact::EternalStorage => "ReserveEternalStorage",
        }
    }

    /// Interface
    pub fn abi(&self) -> &'static Abi {
        match self {
            Artifact::Reserve | Artifact::ReserveV2 => reserve_abi(),
            Artifact::EternalStorage => eternal_storage_abi(),
        }
    }

    /// Code stored at a deployed contract
    pub fn runtime_code(&self) -> Vec<u8> {
        let mut code = vec![NATIVE_PREFIX];
        code.extend_from_slice(&self.id());
        code
    }

    /// Init code deploying this artifact with `args`
    pub fn init_code(&self, args: &[Token]) -> ContractResult<Vec<u8>> {
        let expected = self.abi().constructor();
        if args.len() != expected.len() {
            return Err(ContractError::Abi(format!(
                "{} constructor takes {} arguments, got {}",
                self.name(),
                expected.len(),
                args.len()
            )));
        }
        let mut code = self.runtime_code();
        code.extend_from_slice(&abi::encode(args));
        Ok(code)
    }
}

/// Split native code into its artifact and trailing constructor args.
///
/// Returns `None` for EVM bytecode.
pub fn parse_native_code(code: &[u8]) -> Option<ContractResult<(Artifact, &[u8])>> {
    if code.first() != Some(&NATIVE_PREFIX) {
        return None;
    }
    let Some(id) = code.get(1..5) else {
        return Some(Err(ContractError::Abi("truncated native code".into())));
    };
    let mut raw = [0u8; 4];
    raw.copy_from_slice(id);
    Some(
        Artifact::from_id(raw)
            .map(|artifact| (artifact, &code[5..]))
            .ok_or(ContractError::UnknownArtifact(raw)),
    )
}

/// Init code of the time-utility contract, a compiled
/// `function time() view returns (uint256) { return now; }`
pub const TIME_UTIL_BYTECODE: &str = "0x6080604052348015600f57600080fd5b5060918061001e6000396000f3fe6080604052348015600f57600080fd5b50600436106044577c0100000000000000000000000000000000000000000000000000000000600035046316ada54781146049575b600080fd5b604f6061565b60408051918252519081900360200190f35b429056fea165627a7a723058205524d6a0c4d80ea5535c2ea64615c2619a21518e242cb929275cbd678b04468f0029";

/// ABI of the time-utility contract
pub const TIME_UTIL_ABI: &str = r#"[{"constant":true,"inputs":[],"name":"time","outputs":[{"name":"","type":"uint256"}],"payable":false,"stateMutability":"view","type":"function"}]"#;

/// Decoded time-utility init code
pub fn time_util_init_code() -> ContractResult<Vec<u8>> {
    let digits = TIME_UTIL_BYTECODE.trim_start_matches("0x");
    hex::decode(digits).map_err(|e| ContractError::Abi(e.to_string()))
}

/// Parsed time-utility ABI
pub fn time_util_abi() -> ContractResult<Abi> {
    Abi::from_json(TIME_UTIL_ABI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsv_primitives::Address;

    #[test]
    fn test_ids_roundtrip() {
        for artifact in Artifact::ALL {
            assert_eq!(Artifact::from_id(artifact.id()), Some(artifact));
        }
        assert_eq!(Artifact::from_id(*b"NOPE"), None);
    }

    #[test]
    fn test_parse_native_init_code() {
        let args = [Token::Address(Address::from_low_u64(1)), Token::Address(Address::from_low_u64(2))];
        let code = Artifact::EternalStorage.init_code(&args).unwrap();

        let (artifact, tail) = parse_native_code(&code).unwrap().unwrap();
        assert_eq!(artifact, Artifact::EternalStorage);
        assert_eq!(tail.len(), 64);
    }

    #[test]
    fn test_constructor_arity_is_checked() {
        assert!(Artifact::Reserve.init_code(&[]).is_ok());
        assert!(Artifact::EternalStorage.init_code(&[]).is_err());
    }

    #[test]
    fn test_evm_code_is_not_native() {
        let code = time_util_init_code().unwrap();
        assert_eq!(&code[..4], &[0x60, 0x80, 0x60, 0x40]);
        assert!(parse_native_code(&code).is_none());
        assert!(parse_native_code(&[]).is_none());
    }

    #[test]
    fn test_bad_native_code() {
        assert!(matches!(parse_native_code(&[0xef, 1]), Some(Err(_))));
        assert!(matches!(
            parse_native_code(&[0xef, b'X', b'X', b'X', b'X']),
            Some(Err(ContractError::UnknownArtifact(_)))
        ));
    }
}
