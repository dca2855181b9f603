//! Client integration tests against a scripted transport

use rsv_crypto::private_key_from_hex;
use rsv_sdk::types::{BlockId, CallRequest};
use rsv_sdk::{Address, MockTransport, RpcClient, SdkError, SignedTransaction, H256};
use rsv_types::LegacyTx;
use serde_json::{json, Value};

const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn client_with(transport: &MockTransport) -> RpcClient {
    RpcClient::with_transport(transport.clone())
}

// ==================== Submission ====================

#[tokio::test]
async fn test_send_transaction_posts_raw_rlp() {
    let transport = MockTransport::new();
    let key = private_key_from_hex(KEY).unwrap();
    let tx = LegacyTx {
        nonce: 0,
        gas_price: 1,
        gas_limit: 21_000,
        to: Some(Address::from_low_u64(100)),
        ..Default::default()
    }
    .sign(&key, Some(1337))
    .unwrap();
    transport.set_response("eth_sendRawTransaction", json!(tx.hash().to_hex()));

    let hash = client_with(&transport).send_transaction(&tx).await.unwrap();
    assert_eq!(hash, tx.hash());

    let (method, params) = &transport.requests()[0];
    assert_eq!(method, "eth_sendRawTransaction");
    let raw = hex::decode(params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
    assert_eq!(SignedTransaction::decode_rlp(&raw).unwrap(), tx);
}

#[tokio::test]
async fn test_send_rejected_by_node() {
    let transport = MockTransport::new();
    transport.set_error("eth_sendRawTransaction", -32000, "nonce too low");
    let err = client_with(&transport)
        .send_raw_transaction(&[0xc0])
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Rpc { code: -32000, .. }));
}

// ==================== Receipts ====================

#[tokio::test]
async fn test_failed_receipt_with_created_contract_field() {
    let transport = MockTransport::new();
    transport.set_response(
        "eth_getTransactionReceipt",
        json!({
            "transactionHash": H256::ZERO.to_hex(),
            "blockNumber": "0x10",
            "status": "0x0",
            "gasUsed": "0x7a1200",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "logs": [],
        }),
    );
    let receipt = client_with(&transport)
        .get_receipt(&H256::ZERO)
        .await
        .unwrap()
        .unwrap();
    assert!(!receipt.is_success());
    assert_eq!(receipt.gas_used, 8_000_000);
    assert!(receipt.logs.is_empty());
}

#[tokio::test]
async fn test_malformed_receipt() {
    let transport = MockTransport::new();
    transport.set_response("eth_getTransactionReceipt", json!({"status": "0x1"}));
    let err = client_with(&transport).get_receipt(&H256::ZERO).await.unwrap_err();
    assert!(matches!(err, SdkError::Serialization(_)));
}

// ==================== Vendor methods ====================

#[tokio::test]
async fn test_generic_request() {
    let transport = MockTransport::new();
    transport.set_response("evm_increaseTime", json!(3600));
    let advanced: u64 = client_with(&transport)
        .request("evm_increaseTime", vec![json!(3600)])
        .await
        .unwrap();
    assert_eq!(advanced, 3600);
}

#[tokio::test]
async fn test_unknown_method() {
    let transport = MockTransport::new();
    let err = client_with(&transport)
        .request::<Value>("coverage_report", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Rpc { code: -32601, .. }));
}

#[tokio::test]
async fn test_call_uses_latest_block() {
    let transport = MockTransport::new();
    client_with(&transport)
        .call(
            &CallRequest {
                to: Some(Address::from_low_u64(1)),
                ..Default::default()
            },
            BlockId::Latest,
        )
        .await
        .unwrap();
    let (_, params) = &transport.requests()[0];
    assert_eq!(params[1], json!("latest"));
    assert_eq!(params[0]["to"], json!("0x0000000000000000000000000000000000000001"));
}
