#![recursion_limit = "256"]
// src/lib.rs

use std::sync::Arc;

// Re-export modules
pub mod config;
pub mod rpc;
pub mod utils;
pub mod wallet;

use crate::rpc::node::ChainReader;
use crate::wallet::client::SignClientFactory;
use crate::wallet::services::balance::spawn_balance_refresh;
use crate::wallet::services::event::{EventBridge, Notifier, PushEventSource};
use crate::wallet::services::signer::{SessionSigner, TransactionSubmitter};
use crate::wallet::services::transactions::TransactionBuilder;
use crate::wallet::subscription::Subscription;
use crate::wallet::{ConnectionManager, SessionStore, TransactionCoordinator};

/// Everything a front end needs for one wallet session, owned explicitly and
/// shared by reference.
#[derive(Clone)]
pub struct SessionContext {
    /// Application configuration
    pub config: config::Config,
    /// Session, accounts and balances
    pub store: SessionStore,
    /// Sign client lifecycle
    pub connection: Arc<ConnectionManager>,
    /// Approval/submission flow
    pub transactions: Arc<TransactionCoordinator>,
    /// Current socket event
    pub events: EventBridge,
    /// User-visible alerts
    pub notifier: Notifier,
    chain: Arc<dyn ChainReader>,
}

impl SessionContext {
    pub fn new(
        config: config::Config,
        factory: Arc<dyn SignClientFactory>,
        chain: Arc<dyn ChainReader>,
        submitter: Arc<dyn TransactionSubmitter>,
    ) -> Self {
        let store = SessionStore::new();
        let notifier = Notifier::new(config.notification_capacity);
        let connection = Arc::new(ConnectionManager::new(
            config.client_options(),
            config.default_chains.clone(),
            factory,
            store.clone(),
        ));
        let signer = Arc::new(SessionSigner::new(Arc::clone(&connection)));
        let builder = TransactionBuilder::new(config.fees, config.max_timestamp_valid);
        let transactions = Arc::new(TransactionCoordinator::new(
            builder,
            Arc::clone(&chain),
            signer,
            submitter,
            notifier.clone(),
        ));
        let events = EventBridge::new(notifier.clone());

        Self {
            config,
            store,
            connection,
            transactions,
            events,
            notifier,
            chain,
        }
    }

    /// Refreshes balances whenever the connected accounts change, for as long
    /// as the returned handle is held.
    pub fn start_balance_refresh(&self) -> Subscription {
        spawn_balance_refresh(self.store.clone(), Arc::clone(&self.chain))
    }

    /// Feeds push events from `source` into the event bridge while the handle is held.
    pub fn attach_events(&self, source: &dyn PushEventSource) -> Subscription {
        self.events.attach(source)
    }
}
