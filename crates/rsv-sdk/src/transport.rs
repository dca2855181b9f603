//! Request channel to a node

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::SdkError;

/// JSON-RPC request channel (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `method` with positional `params`, returning the `result` member
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError>;
}

type Scripted = Result<Value, (i64, String)>;

/// Scripted transport for tests
///
/// Answers from per-method responses, falling back to defaults shaped like a
/// freshly started development node. Every request is recorded.
#[derive(Clone)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, Scripted>>>,
    requests: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl MockTransport {
    /// Create with development-node defaults
    pub fn new() -> Self {
        let defaults = [
            ("eth_chainId", "0x539"),
            ("eth_gasPrice", "0x1"),
            ("eth_blockNumber", "0x0"),
            ("eth_getTransactionCount", "0x0"),
            ("eth_estimateGas", "0x5208"),
            ("eth_call", "0x"),
        ];
        let responses = defaults
            .iter()
            .map(|(m, v)| (m.to_string(), Ok(Value::String(v.to_string()))))
            .collect();
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the result of `method`
    pub fn set_response(&self, method: &str, response: Value) {
        self.responses.lock().insert(method.to_string(), Ok(response));
    }

    /// Script a JSON-RPC error for `method`
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        self.responses
            .lock()
            .insert(method.to_string(), Err((code, message.to_string())));
    }

    /// Requests seen so far, in order
    pub fn requests(&self) -> Vec<(String, Vec<Value>)> {
        self.requests.lock().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        self.requests.lock().push((method.to_string(), params));
        match self.responses.lock().get(method).cloned() {
            Some(Ok(value)) => Ok(value),
            Some(Err((code, message))) => Err(SdkError::Rpc { code, message }),
            None => Err(SdkError::Rpc {
                code: -32601,
                message: format!("the method {} does not exist/is not available", method),
            }),
        }
    }
}

/// JSON-RPC 2.0 over HTTP
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Transport posting to `url`
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let id = self.next_id();
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(id, method, "rpc request");

        let response: JsonRpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        // A null result is meaningful (e.g. receipt not yet mined)
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
