//! JSON-RPC client for a Lisk node.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::rpc::protocol::{Request, Response};
use crate::wallet::models::{SignedTransaction, SubmittedTransaction, TokenBalance};
use crate::wallet::services::signer::TransactionSubmitter;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("node request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("node returned error {code}: {message}")]
    Remote { code: i32, message: String },
    #[error("node response for {0} has no result")]
    MissingResult(String),
    #[error("failed to decode node response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid node RPC url: {0}")]
    InvalidUrl(String),
    #[error("malformed value in node response: {0}")]
    Malformed(String),
}

/// Read access to chain state needed to build transactions and show balances.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn auth_nonce(&self, address: &str) -> Result<u64, RpcError>;
    async fn fee_token_id(&self) -> Result<String, RpcError>;
    async fn token_balances(&self, address: &str) -> Result<Vec<TokenBalance>, RpcError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub version: String,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub height: u64,
    #[serde(default)]
    pub finalized_height: u64,
    #[serde(default)]
    pub network_version: String,
}

#[derive(Debug, Deserialize)]
struct AuthAccount {
    nonce: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeTokenId {
    #[serde(rename = "tokenID")]
    token_id: String,
}

#[derive(Debug, Deserialize)]
struct Balances {
    balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone)]
pub struct NodeClient {
    client: Client,
    rpc_url: Url,
    next_id: Arc<AtomicU64>,
}

impl NodeClient {
    pub fn new(rpc_url: &str) -> Result<Self, RpcError> {
        let rpc_url = Url::parse(rpc_url).map_err(|e| RpcError::InvalidUrl(format!("{}: {}", rpc_url, e)))?;
        Ok(Self {
            client: Client::new(),
            rpc_url,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// Posts a JSON-RPC request and decodes its `result`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(id, method, params);
        debug!(%method, id, "node rpc call");

        let response: Response = self
            .client
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        match response.into_result() {
            Ok(Some(result)) => Ok(serde_json::from_value(result)?),
            Ok(None) => Err(RpcError::MissingResult(method.to_string())),
            Err(error) => {
                warn!(%method, code = error.code, "node rpc error: {}", error.message);
                Err(RpcError::Remote {
                    code: error.code,
                    message: error.message,
                })
            }
        }
    }

    pub async fn node_info(&self) -> Result<NodeInfo, RpcError> {
        self.call("system_getNodeInfo", json!({})).await
    }
}

#[async_trait]
impl ChainReader for NodeClient {
    async fn auth_nonce(&self, address: &str) -> Result<u64, RpcError> {
        let account: AuthAccount = self.call("auth_getAuthAccount", json!({ "address": address })).await?;
        account
            .nonce
            .parse()
            .map_err(|_| RpcError::Malformed(format!("nonce {:?}", account.nonce)))
    }

    async fn fee_token_id(&self) -> Result<String, RpcError> {
        let fee: FeeTokenId = self.call("fee_getFeeTokenID", json!({})).await?;
        Ok(fee.token_id)
    }

    async fn token_balances(&self, address: &str) -> Result<Vec<TokenBalance>, RpcError> {
        let balances: Balances = self.call("token_getBalances", json!({ "address": address })).await?;
        Ok(balances.balances)
    }
}

#[async_trait]
impl TransactionSubmitter for NodeClient {
    async fn submit(&self, transaction: &SignedTransaction) -> Result<SubmittedTransaction, RpcError> {
        self.call("txpool_postTransaction", json!({ "transaction": transaction.0 }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(NodeClient::new("not a url"), Err(RpcError::InvalidUrl(_))));
        assert!(NodeClient::new("http://127.0.0.1:7887/rpc").is_ok());
    }

    #[test]
    fn decodes_node_info() {
        let info: NodeInfo = serde_json::from_value(json!({
            "version": "4.0.0",
            "chainID": "04000000",
            "height": 120,
            "finalizedHeight": 100,
            "networkVersion": "1.0"
        }))
        .unwrap();
        assert_eq!(info.chain_id, "04000000");
        assert_eq!(info.finalized_height, 100);
    }
}
