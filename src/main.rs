// src/main.rs

use lisk_dex_session::{
    config::Config,
    rpc::node::{ChainReader, NodeClient},
    utils::format_base_units,
    wallet::address::is_valid_lisk32_address,
    wallet::namespaces::required_namespaces,
};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Token amounts on Lisk use 8 decimals
const DISPLAY_DECIMALS: u8 = 8;

async fn print_balances(node: &NodeClient, address: &str) {
    if !is_valid_lisk32_address(address) {
        error!("❌ Not a valid Lisk32 address: {}", address);
        return;
    }
    match node.token_balances(address).await {
        Ok(balances) if balances.is_empty() => println!("{}: no token balances", address),
        Ok(balances) => {
            for balance in balances {
                let available = balance
                    .available_balance
                    .parse::<u64>()
                    .map(|amount| format_base_units(amount, DISPLAY_DECIMALS))
                    .unwrap_or(balance.available_balance.clone());
                println!("{} {}: {}", address, balance.token_id, available);
            }
        }
        Err(e) => error!("❌ Failed to fetch balances: {}", e),
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lisk_dex_session=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            return;
        }
    };

    match required_namespaces(&config.default_chains) {
        Ok(required) => match serde_json::to_string_pretty(&required) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to render required namespaces: {}", e),
        },
        Err(e) => {
            error!("❌ Default chains cannot be proposed: {}", e);
            return;
        }
    }

    let node = match NodeClient::new(&config.node_rpc_url) {
        Ok(node) => node,
        Err(e) => {
            error!("❌ Failed to initialize node client: {}", e);
            return;
        }
    };

    match node.node_info().await {
        Ok(info) => info!(
            "🚀 Node {} on chain {} at height {}",
            info.version, info.chain_id, info.height
        ),
        Err(e) => warn!("Node at {} is not reachable: {}", node.rpc_url(), e),
    }

    if let Some(address) = env::args().nth(1) {
        print_balances(&node, &address).await;
    }
}
