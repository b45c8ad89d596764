//! External signer client capability.
//!
//! The relay-backed sign client (pairing, proposals, session storage) lives
//! outside this crate. The connection manager only talks to it through
//! [`SignClient`], created on demand by a [`SignClientFactory`].

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::rpc::protocol::Request;
use crate::wallet::models::{ChainId, Pairing, Session, SessionNamespace};
use crate::wallet::namespaces::RequiredNamespaces;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("relay transport error: {0}")]
    Transport(String),
    #[error("rejected by wallet: {0}")]
    Rejected(String),
    #[error("proposal expired")]
    Expired,
    #[error("no session for topic {0}")]
    UnknownTopic(String),
}

/// Metadata advertised to wallets during pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "Lisk DEX".to_string(),
            description: "Lisk decentralized exchange".to_string(),
            url: "https://lisk.com".to_string(),
            icons: Vec::new(),
        }
    }
}

/// Fixed client configuration used when the client is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub project_id: String,
    pub relay_url: String,
    pub metadata: AppMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub pairing_topic: Option<String>,
    pub required_namespaces: RequiredNamespaces,
}

/// An open connection proposal: the URI to show the user and a future that
/// resolves once the wallet approves or rejects.
pub struct ConnectProposal {
    pub uri: Option<String>,
    pub approval: BoxFuture<'static, Result<Session, ClientError>>,
}

impl fmt::Debug for ConnectProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectProposal").field("uri", &self.uri).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectReason {
    pub code: i32,
    pub message: String,
}

impl DisconnectReason {
    pub fn user_disconnected() -> Self {
        Self {
            code: 6000,
            message: "User disconnected.".to_string(),
        }
    }
}

/// Session lifecycle events pushed by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Ping { topic: String },
    Event { topic: String, name: String, data: Value },
    Update { topic: String, namespaces: BTreeMap<String, SessionNamespace> },
    Delete { topic: String },
}

#[async_trait]
pub trait SignClientFactory: Send + Sync {
    async fn create(&self, options: &ClientOptions) -> Result<Arc<dyn SignClient>, ClientError>;
}

#[async_trait]
pub trait SignClient: Send + Sync {
    /// Opens a connection proposal.
    async fn connect(&self, params: ConnectParams) -> Result<ConnectProposal, ClientError>;

    async fn disconnect(&self, topic: &str, reason: DisconnectReason) -> Result<(), ClientError>;

    /// Sends a JSON-RPC request to the wallet over an established session.
    async fn request(&self, topic: &str, chain_id: &ChainId, request: Request) -> Result<Value, ClientError>;

    fn pairings(&self, active_only: bool) -> Vec<Pairing>;

    /// Persisted sessions, oldest first.
    fn sessions(&self) -> Vec<Session>;

    fn session(&self, topic: &str) -> Option<Session>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
