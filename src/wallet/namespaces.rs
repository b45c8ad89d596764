//! Required-namespace resolution for connection proposals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::wallet::models::{ChainId, NamespaceError};

pub const LISK_NAMESPACE: &str = "lisk";

pub const LISK_METHODS: &[&str] = &["sign_transaction", "sign_message"];
pub const LISK_EVENTS: &[&str] = &["accountsChanged", "chainChanged"];

/// What a connection proposal asks the wallet for within one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredNamespace {
    pub methods: Vec<String>,
    pub chains: Vec<ChainId>,
    pub events: Vec<String>,
}

pub type RequiredNamespaces = BTreeMap<String, RequiredNamespace>;

/// Distinct namespaces in first-seen order.
pub fn namespaces_from_chains(chains: &[ChainId]) -> Vec<String> {
    let mut namespaces: Vec<String> = Vec::new();
    for chain in chains {
        if !namespaces.iter().any(|ns| ns == chain.namespace()) {
            namespaces.push(chain.namespace().to_string());
        }
    }
    namespaces
}

pub fn supported_methods(namespace: &str) -> Result<&'static [&'static str], NamespaceError> {
    match namespace {
        LISK_NAMESPACE => Ok(LISK_METHODS),
        other => Err(NamespaceError::UnsupportedNamespace(other.to_string())),
    }
}

pub fn supported_events(namespace: &str) -> Result<&'static [&'static str], NamespaceError> {
    match namespace {
        LISK_NAMESPACE => Ok(LISK_EVENTS),
        other => Err(NamespaceError::UnsupportedNamespace(other.to_string())),
    }
}

/// Builds the required namespaces for a connection proposal over `chains`.
pub fn required_namespaces(chains: &[ChainId]) -> Result<RequiredNamespaces, NamespaceError> {
    let selected = namespaces_from_chains(chains);
    debug!("selected namespaces: {:?}", selected);

    let mut required = RequiredNamespaces::new();
    for namespace in selected {
        let mut ns_chains: Vec<ChainId> = Vec::new();
        for chain in chains.iter().filter(|c| c.namespace() == namespace) {
            if !ns_chains.contains(chain) {
                ns_chains.push(chain.clone());
            }
        }
        let entry = RequiredNamespace {
            methods: supported_methods(&namespace)?.iter().map(|m| m.to_string()).collect(),
            chains: ns_chains,
            events: supported_events(&namespace)?.iter().map(|e| e.to_string()).collect(),
        };
        required.insert(namespace, entry);
    }
    Ok(required)
}
