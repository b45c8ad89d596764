//! Signer and submitter capabilities used by the approval flow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::rpc::node::RpcError;
use crate::rpc::protocol::Request;
use crate::wallet::client::ClientError;
use crate::wallet::connection_manager::ConnectionManager;
use crate::wallet::models::{
    ChainId, FlowId, SessionError, SignedTransaction, SubmittedTransaction, TransactionObject,
};

pub const SIGN_TRANSACTION_METHOD: &str = "sign_transaction";

/// Everything the wallet needs to display and sign one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRequest {
    pub flow_id: FlowId,
    pub chain_id: ChainId,
    pub public_key: String,
    pub schema: Value,
    pub transaction: Arc<TransactionObject>,
}

/// Signer verdict. `valid == false` means the user declined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl SignerResult {
    pub fn signed(payload: impl Into<String>) -> Self {
        Self {
            valid: true,
            result: Some(payload.into()),
        }
    }

    pub fn declined() -> Self {
        Self {
            valid: false,
            result: None,
        }
    }
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transaction(&self, request: &SignRequest) -> Result<SignerResult, SessionError>;
}

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, transaction: &SignedTransaction) -> Result<SubmittedTransaction, RpcError>;
}

/// Signs through the wallet holding the active session.
pub struct SessionSigner {
    connection: Arc<ConnectionManager>,
}

impl SessionSigner {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TransactionSigner for SessionSigner {
    async fn sign_transaction(&self, request: &SignRequest) -> Result<SignerResult, SessionError> {
        let rpc = Request::new(
            request.flow_id.to_string(),
            SIGN_TRANSACTION_METHOD,
            json!({
                "payload": request.transaction.as_ref(),
                "schema": request.schema,
                "recipientChainID": request.chain_id.reference(),
            }),
        );
        debug!(flow = %request.flow_id, chain = %request.chain_id, "requesting signature");

        match self.connection.request(&request.chain_id, rpc).await {
            Ok(Value::String(signed)) => Ok(SignerResult::signed(signed)),
            Ok(other) => serde_json::from_value(other)
                .map_err(|e| SessionError::Client(ClientError::Transport(format!("unexpected signer response: {}", e)))),
            Err(SessionError::Client(ClientError::Rejected(reason))) => {
                info!(flow = %request.flow_id, "signature declined: {}", reason);
                Ok(SignerResult::declined())
            }
            Err(e) => Err(e),
        }
    }
}
