//! RpcClient - typed JSON-RPC wrapper

use std::sync::Arc;

use bytes::Bytes;
use rsv_primitives::{Address, H256};
use rsv_types::{Receipt, SignedTransaction};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::Transport;
use crate::types::{parse_data, parse_quantity, BlockId, CallRequest, RpcReceipt};
use crate::{SdkError, SdkResult};

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Client for an Ethereum-compatible JSON-RPC node
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
}

impl RpcClient {
    /// Client over HTTP; no request is made until the first call
    #[cfg(feature = "http")]
    pub fn http(url: &str) -> Self {
        Self::with_transport(HttpTransport::new(url))
    }

    /// Client over a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Raw request, for methods without a typed wrapper
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> SdkResult<T> {
        let value = self.transport.request_json(method, params).await?;
        serde_json::from_value(value).map_err(|e| SdkError::Serialization(format!("{}: {}", method, e)))
    }

    async fn quantity(&self, method: &str, params: Vec<Value>) -> SdkResult<u64> {
        let raw: String = self.request(method, params).await?;
        Ok(parse_quantity(&raw)?.low_u64())
    }

    // ==================== Chain info ====================

    /// `eth_chainId`
    pub async fn chain_id(&self) -> SdkResult<u64> {
        self.quantity("eth_chainId", vec![]).await
    }

    /// `eth_gasPrice`
    pub async fn gas_price(&self) -> SdkResult<u128> {
        let raw: String = self.request("eth_gasPrice", vec![]).await?;
        Ok(parse_quantity(&raw)?.low_u128())
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> SdkResult<u64> {
        self.quantity("eth_blockNumber", vec![]).await
    }

    /// `eth_getTransactionCount`
    pub async fn get_nonce(&self, address: &Address, block: BlockId) -> SdkResult<u64> {
        self.quantity(
            "eth_getTransactionCount",
            vec![serde_json::to_value(address)?, serde_json::to_value(block)?],
        )
        .await
    }

    // ==================== Execution ====================

    /// `eth_call`
    pub async fn call(&self, request: &CallRequest, block: BlockId) -> SdkResult<Bytes> {
        let raw: String = self
            .request(
                "eth_call",
                vec![serde_json::to_value(request)?, serde_json::to_value(block)?],
            )
            .await?;
        parse_data(&raw)
    }

    /// `eth_estimateGas`
    pub async fn estimate_gas(&self, request: &CallRequest) -> SdkResult<u64> {
        self.quantity("eth_estimateGas", vec![serde_json::to_value(request)?])
            .await
    }

    /// `eth_sendRawTransaction`
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> SdkResult<H256> {
        let hash: String = self
            .request(
                "eth_sendRawTransaction",
                vec![Value::String(format!("0x{}", hex::encode(raw)))],
            )
            .await?;
        Ok(H256::from_hex(&hash)?)
    }

    /// Encode and submit a signed transaction
    pub async fn send_transaction(&self, tx: &SignedTransaction) -> SdkResult<H256> {
        self.send_raw_transaction(&tx.encode_rlp()).await
    }

    /// `eth_getTransactionReceipt`, `None` while pending
    pub async fn get_receipt(&self, hash: &H256) -> SdkResult<Option<Receipt>> {
        let raw: Option<RpcReceipt> = self
            .request("eth_getTransactionReceipt", vec![serde_json::to_value(hash)?])
            .await?;
        raw.map(Receipt::try_from).transpose()
    }
}
