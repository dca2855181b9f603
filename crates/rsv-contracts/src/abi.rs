//! Function tables
//!
//! One [`Abi`] per contract, shared by the native dispatcher (selector to
//! function) and the client bindings (name to function). Native tables are
//! declared statically; the time utility's table is parsed from its JSON.

use std::sync::OnceLock;

use rsv_sdk::abi::{self, ParamType, Token};
use serde::Deserialize;

use crate::{ContractError, ContractResult};

/// Solidity state mutability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Reads nothing
    Pure,
    /// Reads state
    View,
    /// Writes state
    NonPayable,
    /// Writes state and accepts value
    Payable,
}

/// Elementary types used by the static tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    /// `address`
    Address,
    /// `uint256`
    Uint256,
    /// `uint8`
    Uint8,
    /// `bool`
    Bool,
    /// `string`
    String,
}

impl From<Param> for ParamType {
    fn from(param: Param) -> Self {
        match param {
            Param::Address => ParamType::Address,
            Param::Uint256 => ParamType::Uint(256),
            Param::Uint8 => ParamType::Uint(8),
            Param::Bool => ParamType::Bool,
            Param::String => ParamType::String,
        }
    }
}

fn params(list: &[Param]) -> Vec<ParamType> {
    list.iter().copied().map(ParamType::from).collect()
}

/// Static description of a function
#[derive(Clone, Copy, Debug)]
pub struct FunctionSpec {
    /// Function name
    pub name: &'static str,
    /// Input types
    pub inputs: &'static [Param],
    /// Output types
    pub outputs: &'static [Param],
    /// Mutability
    pub mutability: StateMutability,
}

/// A callable function
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Input types
    pub inputs: Vec<ParamType>,
    /// Output types
    pub outputs: Vec<ParamType>,
    /// Mutability
    pub state_mutability: StateMutability,
    selector: [u8; 4],
}

impl Function {
    /// Build a function and compute its selector
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<ParamType>,
        outputs: Vec<ParamType>,
        state_mutability: StateMutability,
    ) -> Self {
        let name = name.into();
        let signature = signature_of(&name, &inputs);
        Self {
            name,
            inputs,
            outputs,
            state_mutability,
            selector: abi::function_selector(&signature),
        }
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        signature_of(&self.name, &self.inputs)
    }

    /// First four bytes of the signature hash
    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Whether calling the function leaves state untouched
    pub fn is_view(&self) -> bool {
        matches!(self.state_mutability, StateMutability::Pure | StateMutability::View)
    }

    /// Selector followed by the encoded arguments
    pub fn encode_input(&self, args: &[Token]) -> ContractResult<Vec<u8>> {
        check_tokens(&self.name, &self.inputs, args)?;
        Ok(abi::encode_function_call(self.selector, args))
    }

    /// Decode arguments, without the selector
    pub fn decode_input(&self, data: &[u8]) -> ContractResult<Vec<Token>> {
        Ok(abi::decode(&self.inputs, data)?)
    }

    /// Encode return values
    pub fn encode_output(&self, values: &[Token]) -> ContractResult<Vec<u8>> {
        check_tokens(&self.name, &self.outputs, values)?;
        Ok(abi::encode(values))
    }

    /// Decode return data
    pub fn decode_output(&self, data: &[u8]) -> ContractResult<Vec<Token>> {
        Ok(abi::decode(&self.outputs, data)?)
    }
}

impl From<&FunctionSpec> for Function {
    fn from(spec: &FunctionSpec) -> Self {
        Function::new(spec.name, params(spec.inputs), params(spec.outputs), spec.mutability)
    }
}

fn signature_of(name: &str, inputs: &[ParamType]) -> String {
    let params: Vec<String> = inputs.iter().map(ParamType::canonical).collect();
    format!("{}({})", name, params.join(","))
}

fn check_tokens(name: &str, types: &[ParamType], tokens: &[Token]) -> ContractResult<()> {
    if types.len() != tokens.len() {
        return Err(ContractError::Abi(format!(
            "{}: expected {} values, got {}",
            name,
            types.len(),
            tokens.len()
        )));
    }
    for (i, (kind, token)) in types.iter().zip(tokens).enumerate() {
        let matches = match (kind, token) {
            // uint8 and uint256 both travel as Token::Uint
            (ParamType::Uint(_), Token::Uint(_)) => true,
            _ => token.type_of() == *kind,
        };
        if !matches {
            return Err(ContractError::Abi(format!(
                "{}: value {} is not a {}",
                name,
                i,
                kind.canonical()
            )));
        }
    }
    Ok(())
}

/// Contract interface
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Abi {
    constructor: Vec<ParamType>,
    functions: Vec<Function>,
}

#[derive(Deserialize)]
struct JsonParam {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonEntry {
    Function {
        name: String,
        #[serde(default)]
        inputs: Vec<JsonParam>,
        #[serde(default)]
        outputs: Vec<JsonParam>,
        #[serde(rename = "stateMutability")]
        state_mutability: Option<StateMutability>,
        #[serde(default)]
        constant: bool,
    },
    Constructor {
        #[serde(default)]
        inputs: Vec<JsonParam>,
    },
    #[serde(other)]
    Other,
}

fn parse_params(params: &[JsonParam]) -> ContractResult<Vec<ParamType>> {
    params
        .iter()
        .map(|p| abi::parse_type(&p.kind).map_err(ContractError::from))
        .collect()
}

impl Abi {
    /// Build from a static table
    pub fn from_specs(constructor: &[Param], specs: &[FunctionSpec]) -> Self {
        Self {
            constructor: params(constructor),
            functions: specs.iter().map(Function::from).collect(),
        }
    }

    /// Parse a solc-style ABI JSON array
    pub fn from_json(json: &str) -> ContractResult<Self> {
        let entries: Vec<JsonEntry> =
            serde_json::from_str(json).map_err(|e| ContractError::Abi(e.to_string()))?;

        let mut parsed = Abi::default();
        for entry in entries {
            match entry {
                JsonEntry::Function {
                    name,
                    inputs,
                    outputs,
                    state_mutability,
                    constant,
                } => {
                    let mutability = state_mutability.unwrap_or(if constant {
                        StateMutability::View
                    } else {
                        StateMutability::NonPayable
                    });
                    parsed.functions.push(Function::new(
                        name,
                        parse_params(&inputs)?,
                        parse_params(&outputs)?,
                        mutability,
                    ));
                }
                JsonEntry::Constructor { inputs } => parsed.constructor = parse_params(&inputs)?,
                JsonEntry::Other => {}
            }
        }
        Ok(parsed)
    }

    /// Constructor argument types
    pub fn constructor(&self) -> &[ParamType] {
        &self.constructor
    }

    /// All functions, in declaration order
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> ContractResult<&Function> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ContractError::UnknownFunction(name.to_string()))
    }

    /// Look up a function by selector
    pub fn by_selector(&self, selector: [u8; 4]) -> Option<&Function> {
        self.functions.iter().find(|f| f.selector == selector)
    }
}

const ADDRESS: Param = Param::Address;
const UINT: Param = Param::Uint256;
const UINT8: Param = Param::Uint8;
const BOOL: Param = Param::Bool;
const STRING: Param = Param::String;

const fn view(name: &'static str, inputs: &'static [Param], outputs: &'static [Param]) -> FunctionSpec {
    FunctionSpec {
        name,
        inputs,
        outputs,
        mutability: StateMutability::View,
    }
}

const fn mutator(
    name: &'static str,
    inputs: &'static [Param],
    outputs: &'static [Param],
) -> FunctionSpec {
    FunctionSpec {
        name,
        inputs,
        outputs,
        mutability: StateMutability::NonPayable,
    }
}

/// `Reserve` and `ReserveV2`
pub const RESERVE_FUNCTIONS: &[FunctionSpec] = &[
    // ERC20
    view("name", &[], &[STRING]),
    view("symbol", &[], &[STRING]),
    view("decimals", &[], &[UINT8]),
    view("totalSupply", &[], &[UINT]),
    view("balanceOf", &[ADDRESS], &[UINT]),
    view("allowance", &[ADDRESS, ADDRESS], &[UINT]),
    mutator("transfer", &[ADDRESS, UINT], &[BOOL]),
    mutator("approve", &[ADDRESS, UINT], &[BOOL]),
    mutator("transferFrom", &[ADDRESS, ADDRESS, UINT], &[BOOL]),
    mutator("increaseAllowance", &[ADDRESS, UINT], &[BOOL]),
    mutator("decreaseAllowance", &[ADDRESS, UINT], &[BOOL]),
    // Roles
    view("owner", &[], &[ADDRESS]),
    view("nominatedOwner", &[], &[ADDRESS]),
    view("minter", &[], &[ADDRESS]),
    view("pauser", &[], &[ADDRESS]),
    view("freezer", &[], &[ADDRESS]),
    view("paused", &[], &[BOOL]),
    view("getEternalStorageAddress", &[], &[ADDRESS]),
    mutator("changeName", &[STRING, STRING], &[]),
    mutator("changeMinter", &[ADDRESS], &[]),
    mutator("changePauser", &[ADDRESS], &[]),
    mutator("changeFreezer", &[ADDRESS], &[]),
    // Supply
    mutator("mint", &[ADDRESS, UINT], &[]),
    mutator("burnFrom", &[ADDRESS, UINT], &[]),
    // Emergency controls
    mutator("pause", &[], &[]),
    mutator("unpause", &[], &[]),
    mutator("freeze", &[ADDRESS], &[]),
    mutator("unfreeze", &[ADDRESS], &[]),
    mutator("wipe", &[ADDRESS], &[]),
    // Ownership and upgrades
    mutator("nominateNewOwner", &[ADDRESS], &[]),
    mutator("acceptOwnership", &[], &[]),
    mutator("renounceOwnership", &[], &[]),
    mutator("transferEternalStorage", &[ADDRESS], &[]),
    mutator("completeHandoff", &[ADDRESS], &[]),
];

/// `ReserveEternalStorage`
pub const ETERNAL_STORAGE_FUNCTIONS: &[FunctionSpec] = &[
    view("owner", &[], &[ADDRESS]),
    view("escapeHatch", &[], &[ADDRESS]),
    mutator("transferOwnership", &[ADDRESS], &[]),
    mutator("transferEscapeHatch", &[ADDRESS], &[]),
    view("balance", &[ADDRESS], &[UINT]),
    mutator("setBalance", &[ADDRESS, UINT], &[]),
    mutator("addBalance", &[ADDRESS, UINT], &[]),
    mutator("subBalance", &[ADDRESS, UINT], &[]),
    view("allowed", &[ADDRESS, ADDRESS], &[UINT]),
    mutator("setAllowed", &[ADDRESS, ADDRESS, UINT], &[]),
    view("frozenTime", &[ADDRESS], &[UINT]),
    mutator("setFrozenTime", &[ADDRESS, UINT], &[]),
];

/// Interface of `Reserve` and `ReserveV2`
pub fn reserve_abi() -> &'static Abi {
    static ABI: OnceLock<Abi> = OnceLock::new();
    ABI.get_or_init(|| Abi::from_specs(&[], RESERVE_FUNCTIONS))
}

/// Interface of `ReserveEternalStorage`
pub fn eternal_storage_abi() -> &'static Abi {
    static ABI: OnceLock<Abi> = OnceLock::new();
    ABI.get_or_init(|| Abi::from_specs(&[ADDRESS, ADDRESS], ETERNAL_STORAGE_FUNCTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::TIME_UTIL_ABI;
    use rsv_primitives::{Address, U256};
    use std::collections::HashSet;

    #[test]
    fn test_well_known_selectors() {
        let abi = reserve_abi();
        assert_eq!(abi.function("transfer").unwrap().selector(), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(abi.function("balanceOf").unwrap().selector(), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(abi.function("approve").unwrap().selector(), [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(abi.function("totalSupply").unwrap().selector(), [0x18, 0x16, 0x0d, 0xdd]);
    }

    #[test]
    fn test_selectors_are_unique() {
        for abi in [reserve_abi(), eternal_storage_abi()] {
            let selectors: HashSet<_> = abi.functions().iter().map(Function::selector).collect();
            assert_eq!(selectors.len(), abi.functions().len());
        }
    }

    #[test]
    fn test_lookup_by_selector() {
        let abi = reserve_abi();
        let mint = abi.function("mint").unwrap();
        assert_eq!(abi.by_selector(mint.selector()).unwrap().signature(), "mint(address,uint256)");
        assert!(abi.by_selector([0, 0, 0, 0]).is_none());
        assert!(matches!(abi.function("selfdestruct"), Err(ContractError::UnknownFunction(_))));
    }

    #[test]
    fn test_encode_input_checks_arguments() {
        let transfer = reserve_abi().function("transfer").unwrap();
        let data = transfer
            .encode_input(&[Token::Address(Address::from_low_u64(1)), Token::Uint(U256::from(5))])
            .unwrap();
        assert_eq!(data.len(), 68);

        assert!(transfer.encode_input(&[Token::Uint(U256::one())]).is_err());
        assert!(transfer
            .encode_input(&[Token::Bool(true), Token::Uint(U256::one())])
            .is_err());
    }

    #[test]
    fn test_time_util_json() {
        let abi = Abi::from_json(TIME_UTIL_ABI).unwrap();
        let time = abi.function("time").unwrap();
        assert_eq!(time.selector(), [0x16, 0xad, 0xa5, 0x47]);
        assert_eq!(time.outputs, vec![ParamType::Uint(256)]);
        assert!(time.is_view());
        assert!(abi.constructor().is_empty());
    }

    #[test]
    fn test_json_skips_events_and_reads_constructor() {
        let json = r#"[
            {"type":"constructor","inputs":[{"name":"owner","type":"address"}]},
            {"type":"event","name":"Ping","inputs":[],"anonymous":false},
            {"type":"function","name":"poke","inputs":[],"outputs":[],"constant":false}
        ]"#;
        let abi = Abi::from_json(json).unwrap();
        assert_eq!(abi.constructor(), &[ParamType::Address]);
        assert_eq!(abi.functions().len(), 1);
        assert_eq!(abi.function("poke").unwrap().state_mutability, StateMutability::NonPayable);
    }
}
