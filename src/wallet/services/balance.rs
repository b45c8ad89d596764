use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rpc::node::ChainReader;
use crate::wallet::models::{Account, AccountBalances};
use crate::wallet::session_store::SessionStore;
use crate::wallet::subscription::Subscription;

/// Fetches per-token balances for `accounts` and stores them, unless the
/// account list changed in the meantime. Accounts whose fetch fails are left out.
pub async fn refresh_balances(store: &SessionStore, chain: &dyn ChainReader, accounts: &[Account]) -> bool {
    store.set_fetching(true);
    let mut balances = AccountBalances::new();
    for account in accounts {
        match chain.token_balances(&account.address).await {
            Ok(tokens) => {
                let by_token: BTreeMap<_, _> = tokens
                    .into_iter()
                    .map(|balance| (balance.token_id.clone(), balance))
                    .collect();
                balances.insert(account.address.clone(), by_token);
            }
            Err(e) => warn!(address = %account.address, "Failed to fetch balances: {}", e),
        }
    }
    let applied = store.set_balances(accounts, balances);
    store.set_fetching(false);
    debug!(accounts = accounts.len(), applied, "balance refresh finished");
    applied
}

/// Starts refreshing balances whenever the store's account list is replaced,
/// including a reconnect that restores the same accounts after a reset.
pub fn spawn_balance_refresh(store: SessionStore, chain: Arc<dyn ChainReader>) -> Subscription {
    Subscription::spawn("balance-refresh", move |mut shutdown| async move {
        let mut updates = store.subscribe();
        let mut last_generation = 0;
        loop {
            let (generation, accounts) = {
                let snapshot = updates.borrow_and_update();
                (snapshot.generation, snapshot.accounts.clone())
            };
            if generation != last_generation {
                last_generation = generation;
                if !accounts.is_empty() {
                    refresh_balances(&store, chain.as_ref(), &accounts).await;
                }
            }

            tokio::select! {
                _ = shutdown.wait() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
