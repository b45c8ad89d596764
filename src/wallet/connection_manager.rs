//! Connection Manager: owns the external signer client and the session lifecycle.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::rpc::protocol::Request;
use crate::wallet::client::{
    ClientOptions, ConnectParams, DisconnectReason, SessionEvent, SignClient, SignClientFactory,
};
use crate::wallet::models::{Account, ChainId, Session, SessionError};
use crate::wallet::namespaces::required_namespaces;
use crate::wallet::session_store::SessionStore;
use crate::wallet::subscription::{Shutdown, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Default)]
struct Inner {
    client: Option<Arc<dyn SignClient>>,
    listener: Option<Subscription>,
}

pub struct ConnectionManager {
    options: ClientOptions,
    default_chains: Vec<ChainId>,
    factory: Arc<dyn SignClientFactory>,
    store: SessionStore,
    state: Arc<watch::Sender<ConnectionState>>,
    inner: Mutex<Inner>,
}

impl ConnectionManager {
    pub fn new(
        options: ClientOptions,
        default_chains: Vec<ChainId>,
        factory: Arc<dyn SignClientFactory>,
        store: SessionStore,
    ) -> Self {
        let (state, _rx) = watch::channel(ConnectionState::Uninitialized);
        Self {
            options,
            default_chains,
            factory,
            store,
            state: Arc::new(state),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.lock().await.client.is_some()
    }

    /// Creates the sign client, starts listening to session events and restores
    /// persisted state. Calling it again after success is a no-op.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.client.is_some() {
            debug!("sign client already initialized");
            return Ok(());
        }

        self.state.send_replace(ConnectionState::Initializing);
        let client = match self.factory.create(&self.options).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create sign client: {}", e);
                self.state.send_replace(ConnectionState::Uninitialized);
                return Err(SessionError::ClientInit(e.to_string()));
            }
        };
        info!(relay = %self.options.relay_url, "sign client created");

        let events = client.subscribe();
        let listener_client = Arc::clone(&client);
        let store = self.store.clone();
        let state = Arc::clone(&self.state);
        inner.listener = Some(Subscription::spawn("session-events", move |shutdown| {
            listen(listener_client, store, state, events, shutdown)
        }));

        let restored = self.restore_persisted(client.as_ref());
        inner.client = Some(client);
        self.state.send_replace(if restored {
            ConnectionState::Connected
        } else {
            ConnectionState::Ready
        });
        Ok(())
    }

    /// Loads pairings and, unless a session is already active, the most recently
    /// stored session that has not expired.
    fn restore_persisted(&self, client: &dyn SignClient) -> bool {
        let pairings = client.pairings(true);
        info!("restored {} active pairings", pairings.len());
        self.store.set_pairings(pairings);

        if self.store.session().is_some() {
            return true;
        }
        let now = Utc::now();
        match client.sessions().into_iter().rev().find(|s| !s.is_expired(now)) {
            Some(session) => {
                info!(topic = %session.topic, "restored persisted session");
                install_session(&self.store, session);
                true
            }
            None => false,
        }
    }

    async fn client(&self) -> Result<Arc<dyn SignClient>, SessionError> {
        self.inner
            .lock()
            .await
            .client
            .clone()
            .ok_or(SessionError::NotInitialized)
    }

    /// Moves to `Connecting` unless a proposal is already pending, returning the
    /// state to restore if the proposal does not complete.
    fn begin_connect(&self) -> Result<ConnectionState, SessionError> {
        let mut previous = None;
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                return false;
            }
            previous = Some(*state);
            *state = ConnectionState::Connecting;
            true
        });
        previous.ok_or(SessionError::ConnectInProgress)
    }

    /// Opens a connection proposal for the selected chains (or the configured
    /// defaults), hands the pairing URI to `on_uri` and waits for the wallet.
    pub async fn connect<F>(&self, pairing_topic: Option<&str>, on_uri: F) -> Result<Session, SessionError>
    where
        F: FnOnce(&str) + Send,
    {
        let client = self.client().await?;
        let previous = self.begin_connect()?;
        debug!(pairing_topic = ?pairing_topic, "connecting");

        let chains = match self.store.chains() {
            chains if chains.is_empty() => self.default_chains.clone(),
            chains => chains,
        };
        let required = match required_namespaces(&chains) {
            Ok(required) => required,
            Err(e) => {
                self.state.send_replace(previous);
                return Err(e.into());
            }
        };

        let params = ConnectParams {
            pairing_topic: pairing_topic.map(str::to_string),
            required_namespaces: required,
        };
        let proposal = match client.connect(params).await {
            Ok(proposal) => proposal,
            Err(e) => {
                warn!("Failed to open connection proposal: {}", e);
                self.state.send_replace(previous);
                return Err(e.into());
            }
        };
        if let Some(uri) = proposal.uri.as_deref() {
            on_uri(uri);
        }

        match proposal.approval.await {
            Ok(session) => {
                info!(topic = %session.topic, "session established");
                install_session(&self.store, session.clone());
                self.store.set_pairings(client.pairings(true));
                self.state.send_replace(ConnectionState::Connected);
                Ok(session)
            }
            Err(e) => {
                info!("connection proposal not approved: {}", e);
                self.state.send_replace(previous);
                Err(SessionError::ConnectionRejected(e.to_string()))
            }
        }
    }

    /// Terminates the active session. Local state is reset whether or not the
    /// relay acknowledges the request.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let client = self.client().await?;
        let session = self.store.session().ok_or(SessionError::NotConnected)?;

        self.state.send_replace(ConnectionState::Disconnecting);
        if let Err(e) = client
            .disconnect(&session.topic, DisconnectReason::user_disconnected())
            .await
        {
            warn!(topic = %session.topic, "disconnect not acknowledged: {}", e);
        }
        self.store.reset();
        self.state.send_replace(ConnectionState::Ready);
        info!(topic = %session.topic, "session disconnected");
        Ok(())
    }

    /// Sends a request to the wallet over the active session.
    pub async fn request(&self, chain_id: &ChainId, request: Request) -> Result<Value, SessionError> {
        let client = self.client().await?;
        let session = self.store.session().ok_or(SessionError::NotConnected)?;
        debug!(method = %request.method, chain = %chain_id, "session request");
        Ok(client.request(&session.topic, chain_id, request).await?)
    }

    pub fn set_chains(&self, chains: Vec<ChainId>) {
        self.store.set_chains(chains);
    }
}

/// Derives accounts from the session and installs both in the store.
/// Entries that do not parse are skipped.
fn install_session(store: &SessionStore, session: Session) {
    let mut accounts: Vec<Account> = Vec::new();
    for entry in session.account_entries() {
        match Account::from_session_account(entry) {
            Ok(account) => accounts.push(account),
            Err(e) => warn!("skipping session account: {}", e),
        }
    }
    let mut chains: Vec<ChainId> = Vec::new();
    for account in &accounts {
        if !chains.contains(&account.chain_id) {
            chains.push(account.chain_id.clone());
        }
    }
    store.apply_session(session, accounts, chains);
}

async fn listen(
    client: Arc<dyn SignClient>,
    store: SessionStore,
    state: Arc<watch::Sender<ConnectionState>>,
    mut events: broadcast::Receiver<SessionEvent>,
    mut shutdown: Shutdown,
) {
    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            event = events.recv() => match event {
                Ok(event) => handle_session_event(client.as_ref(), &store, &state, event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("session event listener lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("session event stream closed");
                    break;
                }
            }
        }
    }
}

fn handle_session_event(
    client: &dyn SignClient,
    store: &SessionStore,
    state: &watch::Sender<ConnectionState>,
    event: SessionEvent,
) {
    let active_topic = store.session().map(|s| s.topic);
    match event {
        SessionEvent::Ping { topic } => debug!(%topic, "session_ping"),
        SessionEvent::Event { topic, name, .. } => info!(%topic, %name, "session_event"),
        SessionEvent::Update { topic, namespaces } => {
            if active_topic.as_deref() != Some(topic.as_str()) {
                debug!(%topic, "ignoring update for inactive session");
                return;
            }
            let base = client.session(&topic).or_else(|| store.session());
            match base {
                Some(mut session) => {
                    info!(%topic, "session_update");
                    session.namespaces = namespaces;
                    install_session(store, session);
                }
                None => warn!(%topic, "session_update for unknown session"),
            }
        }
        SessionEvent::Delete { topic } => {
            if active_topic.as_deref() != Some(topic.as_str()) {
                debug!(%topic, "ignoring delete for inactive session");
                return;
            }
            info!(%topic, "session_delete");
            store.reset();
            state.send_if_modified(|s| {
                if *s == ConnectionState::Connected {
                    *s = ConnectionState::Ready;
                    true
                } else {
                    false
                }
            });
        }
    }
}
