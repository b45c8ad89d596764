// src/wallet/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::wallet::address::lisk32_address_from_public_key;
use crate::wallet::client::ClientError;

// --- Error types ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("unsupported namespace: {0}")]
    UnsupportedNamespace(String),
    #[error("invalid chain identifier: {0}")]
    InvalidChainId(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("malformed session account: {0}")]
    Malformed(String),
    #[error("invalid public key in session account: {0}")]
    InvalidPublicKey(String),
}

/// Errors raised by the connection manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to initialize sign client: {0}")]
    ClientInit(String),
    #[error("sign client is not initialized")]
    NotInitialized,
    #[error("connection proposal was not approved: {0}")]
    ConnectionRejected(String),
    #[error("a connection proposal is already pending")]
    ConnectInProgress,
    #[error("session is not connected")]
    NotConnected,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Errors raised by the approval/submission flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("invalid transaction parameters: {0}")]
    InvalidParams(String),
    #[error("another transaction flow is in progress ({0})")]
    FlowInProgress(FlowPhase),
    #[error("cannot {action} while {phase}")]
    InvalidTransition { action: &'static str, phase: FlowPhase },
    #[error("failed to load account context: {0}")]
    Context(String),
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
}

// --- Chain and account models ---

/// A `namespace:reference` chain identifier, e.g. `lisk:00000000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId {
    namespace: String,
    reference: String,
}

impl ChainId {
    pub fn new(namespace: &str, reference: &str) -> Result<Self, NamespaceError> {
        let valid_namespace = (3..=8).contains(&namespace.len())
            && namespace
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        let valid_reference = (1..=32).contains(&reference.len())
            && reference
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid_namespace || !valid_reference {
            return Err(NamespaceError::InvalidChainId(format!("{}:{}", namespace, reference)));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            reference: reference.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl FromStr for ChainId {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, reference) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| NamespaceError::InvalidChainId(s.to_string()))?;
        Self::new(namespace, reference)
    }
}

impl TryFrom<String> for ChainId {
    type Error = NamespaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> Self {
        chain_id.to_string()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

/// A connected account, derived from a namespace-qualified public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub chain_id: ChainId,
    pub public_key: String,
    pub address: String,
}

impl Account {
    /// Parses a session account entry of the form `namespace:reference:publicKey`
    /// and derives its Lisk32 address.
    pub fn from_session_account(entry: &str) -> Result<Self, AccountError> {
        let mut parts = entry.splitn(3, ':');
        let (namespace, reference, public_key) = match (parts.next(), parts.next(), parts.next()) {
            (Some(ns), Some(reference), Some(pk)) if !pk.is_empty() => (ns, reference, pk),
            _ => return Err(AccountError::Malformed(entry.to_string())),
        };
        let chain_id = ChainId::new(namespace, reference)
            .map_err(|_| AccountError::Malformed(entry.to_string()))?;
        let key_bytes = hex::decode(public_key)
            .map_err(|_| AccountError::InvalidPublicKey(public_key.to_string()))?;
        if key_bytes.is_empty() {
            return Err(AccountError::InvalidPublicKey(public_key.to_string()));
        }

        Ok(Self {
            chain_id,
            public_key: public_key.to_lowercase(),
            address: lisk32_address_from_public_key(&key_bytes),
        })
    }
}

// --- Session models ---

/// Per-namespace part of an approved session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNamespace {
    pub accounts: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_topic: Option<String>,
    pub namespaces: BTreeMap<String, SessionNamespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map_or(false, |expiry| expiry <= now)
    }

    /// All `namespace:reference:publicKey` entries across namespaces.
    pub fn account_entries(&self) -> impl Iterator<Item = &str> {
        self.namespaces
            .values()
            .flat_map(|ns| ns.accounts.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub topic: String,
    pub active: bool,
}

// --- Balance models ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub available_balance: String,
    #[serde(default)]
    pub locked_balances: Vec<LockedBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalance {
    pub module: String,
    pub amount: String,
}

/// Balances keyed by account address, then by token id.
pub type AccountBalances = BTreeMap<String, BTreeMap<String, TokenBalance>>;

// --- Transaction models ---

/// A chain transaction as handed to the signer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionObject {
    pub module: String,
    pub command: String,
    pub sender_public_key: String,
    pub nonce: String,
    pub fee: String,
    pub params: Value,
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowPhase {
    Idle,
    Building,
    AwaitingSignature,
    AwaitingApproval,
    Submitting,
    Succeeded,
    Failed,
}

impl FlowPhase {
    pub fn transaction_status(self) -> Option<TransactionStatus> {
        match self {
            FlowPhase::Idle => None,
            FlowPhase::Building
            | FlowPhase::AwaitingSignature
            | FlowPhase::AwaitingApproval
            | FlowPhase::Submitting => Some(TransactionStatus::Pending),
            FlowPhase::Succeeded => Some(TransactionStatus::Success),
            FlowPhase::Failed => Some(TransactionStatus::Failure),
        }
    }
}

impl fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowPhase::Idle => "IDLE",
            FlowPhase::Building => "BUILDING",
            FlowPhase::AwaitingSignature => "AWAITING_SIGNATURE",
            FlowPhase::AwaitingApproval => "AWAITING_APPROVAL",
            FlowPhase::Submitting => "SUBMITTING",
            FlowPhase::Succeeded => "SUCCEEDED",
            FlowPhase::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Identifies one approval flow so late results can be matched or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(Uuid);

impl FlowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Signed transaction payload returned by the signer (hex encoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTransaction {
    pub transaction_id: String,
}
