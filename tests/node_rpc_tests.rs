//! Node JSON-RPC client tests against a mock HTTP server

use mockito::{mock, Matcher};
use serde_json::json;

use lisk_dex_session::{
    rpc::node::{ChainReader, NodeClient, RpcError},
    wallet::models::SignedTransaction,
    wallet::services::signer::TransactionSubmitter,
};

const ADDRESS: &str = "lskdxc4ta5j43jp9ro3f8zqbxta9fn6jwzjucw7yt";

fn client(path: &str) -> NodeClient {
    NodeClient::new(&format!("{}{}", mockito::server_url(), path)).unwrap()
}

fn rpc_result(result: serde_json::Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

#[tokio::test]
async fn reads_auth_nonce() {
    let _m = mock("POST", "/nonce")
        .match_body(Matcher::PartialJson(json!({
            "jsonrpc": "2.0",
            "method": "auth_getAuthAccount",
            "params": { "address": ADDRESS }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "nonce": "42", "numberOfSignatures": 0 })))
        .create();

    assert_eq!(client("/nonce").auth_nonce(ADDRESS).await.unwrap(), 42);
}

#[tokio::test]
async fn non_numeric_nonce_is_malformed() {
    let _m = mock("POST", "/bad-nonce")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "nonce": "forty" })))
        .create();

    let err = client("/bad-nonce").auth_nonce(ADDRESS).await.unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));
}

#[tokio::test]
async fn reads_fee_token_and_balances() {
    let _fee = mock("POST", "/state")
        .match_body(Matcher::PartialJson(json!({ "method": "fee_getFeeTokenID" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "tokenID": "0400000000000000" })))
        .create();
    let _balances = mock("POST", "/state")
        .match_body(Matcher::PartialJson(json!({ "method": "token_getBalances" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({
            "balances": [
                {
                    "tokenID": "0400000000000000",
                    "availableBalance": "125000000",
                    "lockedBalances": [{ "module": "dex", "amount": "5000" }]
                },
                { "tokenID": "0400000100000000", "availableBalance": "7" }
            ]
        })))
        .create();

    let node = client("/state");
    assert_eq!(node.fee_token_id().await.unwrap(), "0400000000000000");

    let balances = node.token_balances(ADDRESS).await.unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].available_balance, "125000000");
    assert_eq!(balances[0].locked_balances[0].module, "dex");
    assert!(balances[1].locked_balances.is_empty());
}

#[tokio::test]
async fn surfaces_remote_errors() {
    let _m = mock("POST", "/error")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "Invalid address" }
            })
            .to_string(),
        )
        .create();

    match client("/error").auth_nonce("nope").await {
        Err(RpcError::Remote { code, message }) => {
            assert_eq!(code, -32602);
            assert_eq!(message, "Invalid address");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn posts_signed_transactions() {
    let m = mock("POST", "/txpool")
        .match_body(Matcher::PartialJson(json!({
            "method": "txpool_postTransaction",
            "params": { "transaction": "0a03646578" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({ "transactionId": "b7c1" })))
        .expect(1)
        .create();

    let submitted = client("/txpool")
        .submit(&SignedTransaction("0a03646578".into()))
        .await
        .unwrap();
    assert_eq!(submitted.transaction_id, "b7c1");
    m.assert();
}

#[tokio::test]
async fn reads_node_info() {
    let _m = mock("POST", "/info")
        .match_body(Matcher::PartialJson(json!({ "method": "system_getNodeInfo" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!({
            "version": "4.0.1",
            "chainID": "04000000",
            "height": 1800,
            "finalizedHeight": 1750,
            "networkVersion": "1.0"
        })))
        .create();

    let info = client("/info").node_info().await.unwrap();
    assert_eq!(info.chain_id, "04000000");
    assert_eq!(info.height, 1800);
}
