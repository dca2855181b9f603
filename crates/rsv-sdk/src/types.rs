//! Request and response shapes for the JSON-RPC surface

use bytes::Bytes;
use rsv_primitives::{Address, H256, U256};
use rsv_types::{Log, Receipt, TxStatus};
use serde::{Deserialize, Serialize, Serializer};

use crate::{SdkError, SdkResult};

/// Block selector for state queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Specific height
    Number(u64),
    /// Latest mined block
    #[default]
    Latest,
    /// Latest block plus the pending pool
    Pending,
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&format!("0x{:x}", n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
        }
    }
}

/// Message object for `eth_call` and `eth_estimateGas`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Target, `None` for a creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Gas limit
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "quantity_u64")]
    pub gas: Option<u64>,
    /// Gas price
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "quantity_u128")]
    pub gas_price: Option<u128>,
    /// Value in wei
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "quantity_u128")]
    pub value: Option<u128>,
    /// Call data or init code
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "hex_data")]
    pub data: Option<Bytes>,
}

fn quantity_u64<S: Serializer>(v: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => s.serialize_str(&format!("0x{:x}", v)),
        None => s.serialize_none(),
    }
}

fn quantity_u128<S: Serializer>(v: &Option<u128>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => s.serialize_str(&format!("0x{:x}", v)),
        None => s.serialize_none(),
    }
}

fn hex_data<S: Serializer>(v: &Option<Bytes>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(b) => s.serialize_str(&format!("0x{}", hex::encode(b))),
        None => s.serialize_none(),
    }
}

/// Receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Transaction hash
    pub transaction_hash: H256,
    /// Hex block number
    pub block_number: String,
    /// `0x1` success, `0x0` failure; absent on pre-Byzantium nodes
    #[serde(default)]
    pub status: Option<String>,
    /// Hex gas used
    pub gas_used: String,
    /// Hex cumulative gas used
    #[serde(default)]
    pub cumulative_gas_used: Option<String>,
    /// Created contract
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// Emitted logs
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

/// Log entry inside [`RpcReceipt`]
#[derive(Debug, Clone, Deserialize)]
pub struct RpcLog {
    /// Emitter
    pub address: Address,
    /// Topics
    pub topics: Vec<H256>,
    /// Hex data
    pub data: String,
}

impl TryFrom<RpcReceipt> for Receipt {
    type Error = SdkError;

    fn try_from(raw: RpcReceipt) -> SdkResult<Self> {
        let status = match raw.status.as_deref() {
            Some(s) => TxStatus::from(!parse_quantity(s)?.is_zero()),
            None => return Err(SdkError::MissingField("status")),
        };
        let gas_used = parse_quantity(&raw.gas_used)?.low_u64();
        let logs = raw
            .logs
            .into_iter()
            .map(|l| Ok(Log::new(l.address, l.topics, parse_data(&l.data)?)))
            .collect::<SdkResult<Vec<_>>>()?;

        let mut receipt = Receipt::new(
            raw.transaction_hash,
            parse_quantity(&raw.block_number)?.low_u64(),
            status,
            gas_used,
        )
        .with_logs(logs);
        if let Some(cumulative) = raw.cumulative_gas_used {
            receipt.cumulative_gas_used = parse_quantity(&cumulative)?.low_u64();
        }
        receipt.contract_address = raw.contract_address;
        Ok(receipt)
    }
}

/// Parse a hex quantity such as `0x1a`
pub fn parse_quantity(s: &str) -> SdkResult<U256> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| SdkError::InvalidHex(format!("{}: {}", s, e)))
}

/// Parse hex data such as `0xdeadbeef`
pub fn parse_data(s: &str) -> SdkResult<Bytes> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    Ok(Bytes::from(hex::decode(digits)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_id_serialize() {
        assert_eq!(serde_json::to_value(BlockId::Latest).unwrap(), json!("latest"));
        assert_eq!(serde_json::to_value(BlockId::Number(100)).unwrap(), json!("0x64"));
    }

    #[test]
    fn test_call_request_skips_empty_fields() {
        let req = CallRequest {
            from: Some(Address::from_low_u64(1)),
            to: Some(Address::from_low_u64(2)),
            data: Some(Bytes::from_static(&[0x16, 0xad, 0xa5, 0x47])),
            gas_price: Some(1),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "from": "0x0000000000000000000000000000000000000001",
                "to": "0x0000000000000000000000000000000000000002",
                "gasPrice": "0x1",
                "data": "0x16ada547",
            })
        );
    }

    #[test]
    fn test_receipt_conversion() {
        let raw: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x2",
            "status": "0x1",
            "gasUsed": "0x5208",
            "cumulativeGasUsed": "0x5208",
            "contractAddress": null,
            "logs": [{
                "address": "0x0000000000000000000000000000000000000009",
                "topics": [format!("0x{}", "22".repeat(32))],
                "data": "0x01",
            }],
        }))
        .unwrap();
        let receipt = Receipt::try_from(raw).unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.block_number, 2);
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].data.as_ref(), &[0x01]);
        assert!(receipt.contract_address.is_none());
    }

    #[test]
    fn test_receipt_without_status_is_rejected() {
        let raw: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x2",
            "gasUsed": "0x0",
        }))
        .unwrap();
        assert!(matches!(Receipt::try_from(raw), Err(SdkError::MissingField("status"))));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), U256::zero());
        assert_eq!(parse_quantity("0x").unwrap(), U256::zero());
        assert_eq!(parse_quantity("0x3b9aca00").unwrap(), U256::from(1_000_000_000u64));
        assert!(parse_quantity("0xzz").is_err());
    }
}
