// src/wallet/nonce_manager.rs

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::rpc::node::{ChainReader, RpcError};

// Tracks the next nonce per sender address so consecutive flows don't reuse one.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // The DashMap allows concurrent access to different address states.
    nonces: DashMap<String, Arc<Mutex<NonceState>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<u64>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self {
            nonces: DashMap::new(),
        }
    }

    fn state_for(&self, address: &str) -> Arc<Mutex<NonceState>> {
        self.nonces
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone()
    }

    /// Returns the nonce the next transaction from `address` should use,
    /// fetching it from the node when nothing is cached. Does not advance it.
    pub async fn next_nonce(&self, address: &str, chain: &dyn ChainReader) -> Result<u64, RpcError> {
        let lock = self.state_for(address);
        let mut state = lock.lock().await;

        match state.next_nonce {
            Some(nonce) => Ok(nonce),
            None => {
                let nonce = chain.auth_nonce(address).await?;
                debug!(%address, nonce, "fetched account nonce");
                state.next_nonce = Some(nonce);
                Ok(nonce)
            }
        }
    }

    /// Records that `used` was accepted by the node.
    pub async fn commit(&self, address: &str, used: u64) {
        let lock = self.state_for(address);
        let mut state = lock.lock().await;
        let next = used.saturating_add(1);
        if state.next_nonce.map_or(true, |current| current <= next) {
            state.next_nonce = Some(next);
        }
    }

    /// Forgets the cached nonce so the next flow refetches it.
    pub async fn release(&self, address: &str) {
        let lock = self.state_for(address);
        lock.lock().await.next_nonce = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::models::TokenBalance;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingChain {
        nonce: u64,
        calls: AtomicU64,
    }

    #[async_trait]
    impl ChainReader for CountingChain {
        async fn auth_nonce(&self, _address: &str) -> Result<u64, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.nonce)
        }

        async fn fee_token_id(&self) -> Result<String, RpcError> {
            Ok("0000000000000000".to_string())
        }

        async fn token_balances(&self, _address: &str) -> Result<Vec<TokenBalance>, RpcError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn caches_until_committed_or_released() {
        let chain = CountingChain { nonce: 5, calls: AtomicU64::new(0) };
        let manager = NonceManager::new();

        assert_eq!(manager.next_nonce("lskaddr", &chain).await.unwrap(), 5);
        assert_eq!(manager.next_nonce("lskaddr", &chain).await.unwrap(), 5);
        assert_eq!(chain.calls.load(Ordering::SeqCst), 1);

        manager.commit("lskaddr", 5).await;
        assert_eq!(manager.next_nonce("lskaddr", &chain).await.unwrap(), 6);

        manager.release("lskaddr").await;
        assert_eq!(manager.next_nonce("lskaddr", &chain).await.unwrap(), 5);
        assert_eq!(chain.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn addresses_are_independent() {
        let chain = CountingChain { nonce: 1, calls: AtomicU64::new(0) };
        let manager = NonceManager::new();
        manager.next_nonce("a", &chain).await.unwrap();
        manager.commit("a", 1).await;
        assert_eq!(manager.next_nonce("b", &chain).await.unwrap(), 1);
        assert_eq!(manager.next_nonce("a", &chain).await.unwrap(), 2);
    }
}
