use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_CHANNEL_CAPACITY;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::models::{BalanceRecord, QueryPair};
use crate::price::{PriceConverter, COINGECKO_API_BASE};
use crate::registry::REGISTRY_BASE_URL;

fn default_registry_url() -> String {
    REGISTRY_BASE_URL.to_string()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_endpoint_deadline() -> Duration {
    Duration::from_secs(3)
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_coingecko_url() -> String {
    COINGECKO_API_BASE.to_string()
}

fn default_quote_currency() -> String {
    "usd".to_string()
}

/// A chain to query, by registry name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,

    /// Bech32 prefix; taken from the chain registry when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Network timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for a single endpoint health probe.
    #[serde(
        default = "default_probe_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub probe: Duration,

    /// Overall budget for picking a REST endpoint on one network.
    #[serde(
        default = "default_endpoint_deadline",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub endpoint_deadline: Duration,

    /// Timeout for registry documents and balance queries.
    #[serde(
        default = "default_query_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub query: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe: default_probe_timeout(),
            endpoint_deadline: default_endpoint_deadline(),
            query: default_query_timeout(),
        }
    }
}

/// Price source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    /// Base URL of the CoinGecko API. Set to an empty string to skip fetching.
    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,

    /// Currency prices are quoted in (e.g., "usd").
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    /// Fixed prices by symbol; these win over fetched prices.
    #[serde(rename = "static")]
    pub static_prices: HashMap<String, Decimal>,

    /// Extra symbol to CoinGecko id mappings.
    pub mappings: HashMap<String, String>,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            coingecko_url: default_coingecko_url(),
            quote_currency: default_quote_currency(),
            static_prices: HashMap::new(),
            mappings: HashMap::new(),
        }
    }
}

/// A manually declared holding, reported alongside queried balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedBalance {
    pub network: String,
    pub account: String,
    pub token: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<Decimal>,
}

impl FixedBalance {
    /// Converts to a record, pricing it when no fiat value was declared.
    pub fn to_record(&self, prices: &dyn PriceConverter) -> BalanceRecord {
        BalanceRecord {
            network: self.network.clone(),
            account: self.account.clone(),
            hex_address: String::new(),
            token: self.token.clone(),
            amount: self.amount,
            usd_value: self
                .usd_value
                .unwrap_or_else(|| prices.usd_value(&self.token, self.amount)),
            decimals: 0,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chain registry.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Canonical account addresses, queried on every network.
    pub addresses: Vec<String>,

    /// Networks to query.
    pub networks: Vec<NetworkConfig>,

    /// Capacity of the result stream.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    pub timeouts: TimeoutConfig,

    pub prices: PriceConfig,

    pub fixed_balances: Vec<FixedBalance>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            addresses: Vec::new(),
            networks: Vec::new(),
            channel_capacity: default_channel_capacity(),
            timeouts: TimeoutConfig::default(),
            prices: PriceConfig::default(),
            fixed_balances: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Every (network, address) combination to query.
    pub fn query_pairs(&self) -> Vec<QueryPair> {
        let mut pairs = Vec::with_capacity(self.networks.len() * self.addresses.len());
        for network in &self.networks {
            for address in &self.addresses {
                let mut pair = QueryPair::new(network.name.as_str(), address.as_str());
                pair.prefix = network.prefix.clone();
                pairs.push(pair);
            }
        }
        pairs
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./cosmoscope.toml` if it exists in current directory
/// 2. `~/.config/cosmoscope/cosmoscope.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("cosmoscope.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cosmoscope").join("cosmoscope.toml");
    }

    local_config
}
