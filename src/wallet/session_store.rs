//! Session Store: the single owner of session, account and balance state.
//!
//! State lives in one snapshot published through a `watch` channel, so every
//! mutation (including `reset`) is observed as a whole by subscribers.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::wallet::models::{Account, AccountBalances, ChainId, Pairing, Session};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub pairings: Vec<Pairing>,
    pub accounts: Vec<Account>,
    pub balances: AccountBalances,
    pub chains: Vec<ChainId>,
    pub fetching_balances: bool,
    /// Bumped whenever the account list is replaced or the store is reset.
    pub generation: u64,
}

impl SessionSnapshot {
    /// True when no session-scoped data is left.
    pub fn is_cleared(&self) -> bool {
        self.session.is_none() && self.accounts.is_empty() && self.balances.is_empty() && self.chains.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.tx.borrow().session.clone()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.tx.borrow().accounts.clone()
    }

    pub fn chains(&self) -> Vec<ChainId> {
        self.tx.borrow().chains.clone()
    }

    pub fn balances(&self) -> AccountBalances {
        self.tx.borrow().balances.clone()
    }

    pub fn is_fetching_balances(&self) -> bool {
        self.tx.borrow().fetching_balances
    }

    pub fn set_chains(&self, chains: Vec<ChainId>) {
        self.tx.send_modify(|state| state.chains = chains);
    }

    pub fn set_pairings(&self, pairings: Vec<Pairing>) {
        debug!("pairing cache holds {} entries", pairings.len());
        self.tx.send_modify(|state| state.pairings = pairings);
    }

    /// Installs an approved or restored session with its derived accounts.
    pub fn apply_session(&self, session: Session, accounts: Vec<Account>, chains: Vec<ChainId>) {
        info!(topic = %session.topic, accounts = accounts.len(), "session applied");
        self.tx.send_modify(|state| {
            if state.accounts != accounts {
                state.balances.clear();
                state.generation += 1;
            }
            state.session = Some(session);
            state.accounts = accounts;
            state.chains = chains;
        });
    }

    pub fn set_fetching(&self, fetching: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.fetching_balances != fetching;
            state.fetching_balances = fetching;
            changed
        });
    }

    /// Stores freshly fetched balances, unless the account list changed while
    /// they were being fetched. Returns whether they were applied.
    pub fn set_balances(&self, for_accounts: &[Account], balances: AccountBalances) -> bool {
        self.tx.send_if_modified(|state| {
            if state.accounts != for_accounts {
                debug!("discarding balances fetched for a stale account list");
                return false;
            }
            state.balances = balances;
            true
        })
    }

    /// Clears session, accounts, balances and chains in one update.
    /// Known pairings are kept, they outlive sessions.
    pub fn reset(&self) {
        info!("resetting session store");
        self.tx.send_modify(|state| {
            state.session = None;
            state.accounts.clear();
            state.balances.clear();
            state.chains.clear();
            state.fetching_balances = false;
            state.generation += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::models::TokenBalance;
    use std::collections::BTreeMap;

    fn session(topic: &str) -> Session {
        Session {
            topic: topic.to_string(),
            pairing_topic: None,
            namespaces: BTreeMap::new(),
            expiry: None,
        }
    }

    fn account() -> Account {
        Account::from_session_account("lisk:1:ab12").unwrap()
    }

    fn balances_for(account: &Account) -> AccountBalances {
        let mut tokens = BTreeMap::new();
        tokens.insert(
            "0000000000000000".to_string(),
            TokenBalance {
                token_id: "0000000000000000".to_string(),
                available_balance: "100".to_string(),
                locked_balances: vec![],
            },
        );
        let mut balances = AccountBalances::new();
        balances.insert(account.address.clone(), tokens);
        balances
    }

    #[test]
    fn reset_clears_everything_in_one_update() {
        let store = SessionStore::new();
        let account = account();
        store.set_pairings(vec![Pairing { topic: "p1".into(), active: true }]);
        store.apply_session(session("t1"), vec![account.clone()], vec![account.chain_id.clone()]);
        assert!(store.set_balances(&[account.clone()], balances_for(&account)));

        let mut rx = store.subscribe();
        rx.borrow_and_update();
        store.reset();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert!(seen.is_cleared());
        assert_eq!(seen.pairings.len(), 1);
    }

    #[test]
    fn stale_balances_are_discarded() {
        let store = SessionStore::new();
        let account = account();
        store.apply_session(session("t1"), vec![account.clone()], vec![]);
        store.reset();
        assert!(!store.set_balances(&[account.clone()], balances_for(&account)));
        assert!(store.balances().is_empty());
    }

    #[test]
    fn new_account_list_drops_old_balances() {
        let store = SessionStore::new();
        let account = account();
        store.apply_session(session("t1"), vec![account.clone()], vec![]);
        store.set_balances(&[account.clone()], balances_for(&account));

        let other = Account::from_session_account("lisk:1:cd34").unwrap();
        store.apply_session(session("t1"), vec![other], vec![]);
        assert!(store.balances().is_empty());
    }

    #[test]
    fn reset_and_reconnect_with_same_accounts_starts_a_new_generation() {
        let store = SessionStore::new();
        let account = account();
        store.apply_session(session("t1"), vec![account.clone()], vec![]);
        let first = store.snapshot().generation;

        store.apply_session(session("t1"), vec![account.clone()], vec![]);
        assert_eq!(store.snapshot().generation, first);

        store.reset();
        store.apply_session(session("t2"), vec![account.clone()], vec![]);
        let after = store.snapshot();
        assert!(after.generation > first);
        assert_eq!(after.accounts, vec![account]);
    }
}
