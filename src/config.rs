// src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use url::Url;

use crate::wallet::client::{AppMetadata, ClientOptions};
use crate::wallet::models::ChainId;
use crate::wallet::services::fees::FeePolicy;
use crate::wallet::services::transactions::DEFAULT_MAX_TIMESTAMP_VALID;

pub const DEFAULT_RELAY_URL: &str = "wss://relay.walletconnect.com";
pub const DEFAULT_NODE_RPC_URL: &str = "http://127.0.0.1:7887/rpc";
pub const DEFAULT_CHAIN: &str = "lisk:00000000";

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Wallet relay settings
    pub project_id: String,
    pub relay_url: String,
    pub metadata: AppMetadata,
    /// Chains proposed when the user hasn't selected any.
    pub default_chains: Vec<ChainId>,

    // Node settings
    pub node_rpc_url: String,

    // Transaction settings
    pub fees: FeePolicy,
    pub max_timestamp_valid: u64,

    pub notification_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = FeePolicy::default();
        Self {
            project_id: String::new(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            metadata: AppMetadata::default(),
            default_chains: parse_chains(DEFAULT_CHAIN).unwrap_or_default(),
            node_rpc_url: DEFAULT_NODE_RPC_URL.to_string(),
            fees: defaults,
            max_timestamp_valid: DEFAULT_MAX_TIMESTAMP_VALID,
            notification_capacity: 64,
        }
    }
}

fn parsed_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("{} must be a valid number", name))
}

/// Parses a comma-separated list of chain ids, ignoring blanks.
pub fn parse_chains(value: &str) -> Result<Vec<ChainId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ChainId>().with_context(|| format!("invalid chain id {:?}", s)))
        .collect()
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let defaults = AppMetadata::default();
        let metadata = AppMetadata {
            name: env::var("APP_NAME").unwrap_or(defaults.name),
            description: env::var("APP_DESCRIPTION").unwrap_or(defaults.description),
            url: env::var("APP_URL").unwrap_or(defaults.url),
            icons: env::var("APP_ICONS")
                .map(|icons| {
                    icons
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.icons),
        };

        let relay_url = env::var("WALLETCONNECT_RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string());
        Url::parse(&relay_url).context("WALLETCONNECT_RELAY_URL must be a valid URL")?;

        let default_chains = parse_chains(&env::var("DEFAULT_CHAINS").unwrap_or_else(|_| DEFAULT_CHAIN.to_string()))
            .context("DEFAULT_CHAINS must be a comma-separated list of namespace:reference ids")?;

        let node_rpc_url = env::var("NODE_RPC_URL").unwrap_or_else(|_| DEFAULT_NODE_RPC_URL.to_string());
        Url::parse(&node_rpc_url).context("NODE_RPC_URL must be a valid URL")?;

        Ok(Config {
            project_id: env::var("WALLETCONNECT_PROJECT_ID").unwrap_or_default(),
            relay_url,
            metadata,
            default_chains,
            node_rpc_url,
            fees: FeePolicy {
                base_fee: parsed_var("BASE_FEE", "1000000")?,
                pool_creation_fee: parsed_var("POOL_CREATION_FEE", "0")?,
                position_creation_fee: parsed_var("POSITION_CREATION_FEE", "0")?,
            },
            max_timestamp_valid: parsed_var("MAX_TIMESTAMP_VALID", &DEFAULT_MAX_TIMESTAMP_VALID.to_string())?,
            notification_capacity: parsed_var("NOTIFICATION_CAPACITY", "64")?,
        })
    }

    /// Options the sign client is created with.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            project_id: self.project_id.clone(),
            relay_url: self.relay_url.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
