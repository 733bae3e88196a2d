//! Fiat conversion for resolved token amounts.
//!
//! Prices are loaded once before aggregation starts; lookups during the run
//! are synchronous and never fail (unknown symbols are worth zero).

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

use crate::config::PriceConfig;

pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Converts a token amount into the reporting currency.
pub trait PriceConverter: Send + Sync {
    fn usd_value(&self, symbol: &str, amount: Decimal) -> Decimal;
}

/// In-memory symbol to unit price map. Symbols are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, price: Decimal) {
        self.prices.insert(symbol.to_uppercase(), price);
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.insert(symbol, price);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.prices.get(&symbol.to_uppercase()).copied()
    }

    /// Copies every price from `other`, overwriting existing entries.
    pub fn extend(&mut self, other: PriceTable) {
        self.prices.extend(other.prices);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceConverter for PriceTable {
    fn usd_value(&self, symbol: &str, amount: Decimal) -> Decimal {
        let Some(price) = self.get(symbol) else {
            return Decimal::ZERO;
        };
        price.checked_mul(amount).unwrap_or_else(|| {
            tracing::warn!(
                symbol,
                amount = %amount,
                price = %price,
                "fiat value out of range; reporting zero"
            );
            Decimal::ZERO
        })
    }
}

/// Loads current prices for Cosmos-ecosystem tokens from CoinGecko.
///
/// Uses the free `/simple/price` endpoint; no API key required.
pub struct CoinGeckoPrices {
    client: reqwest::Client,
    base_url: String,
    /// Quote currency for prices (e.g., "usd", "eur")
    quote_currency: String,
    /// Custom symbol to CoinGecko ID mappings (overrides defaults)
    custom_mappings: HashMap<String, String>,
}

impl CoinGeckoPrices {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: COINGECKO_API_BASE.to_string(),
            quote_currency: "usd".to_string(),
            custom_mappings: HashMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_quote_currency(mut self, currency: impl Into<String>) -> Self {
        self.quote_currency = currency.into().to_lowercase();
        self
    }

    pub fn with_custom_mappings(mut self, mappings: HashMap<String, String>) -> Self {
        self.custom_mappings = mappings
            .into_iter()
            .map(|(symbol, id)| (symbol.to_uppercase(), id))
            .collect();
        self
    }

    /// Every (symbol, CoinGecko id) pair this source knows about.
    ///
    /// Custom mappings replace built-in ones for the same symbol.
    fn known_ids(&self) -> HashMap<String, String> {
        let mut ids: HashMap<String, String> = BUILTIN_IDS
            .iter()
            .map(|(symbol, id)| (symbol.to_string(), id.to_string()))
            .collect();
        ids.extend(self.custom_mappings.clone());
        ids
    }

    /// Fetches prices for every known symbol in one request.
    pub async fn fetch(&self) -> Result<PriceTable> {
        let ids = self.known_ids();
        let mut id_list: Vec<&str> = ids.values().map(String::as_str).collect();
        id_list.sort_unstable();
        id_list.dedup();

        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            id_list.join(","),
            self.quote_currency
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", "cosmoscope (https://github.com/anilcse/cosmoscope)")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("CoinGecko simple/price API error: {} - {}", status, body));
        }

        let data: HashMap<String, HashMap<String, f64>> = response.json().await?;

        let mut table = PriceTable::new();
        for (symbol, id) in &ids {
            let Some(price) = data.get(id).and_then(|p| p.get(&self.quote_currency)) else {
                continue;
            };
            match Decimal::try_from(*price) {
                Ok(price) => table.insert(symbol, price),
                Err(err) => tracing::debug!(symbol = %symbol, error = %err, "unrepresentable price"),
            }
        }

        tracing::debug!(prices = table.len(), "loaded CoinGecko prices");
        Ok(table)
    }
}

impl Default for CoinGeckoPrices {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the price table for a run: CoinGecko prices overlaid with static ones.
///
/// A failed fetch is logged and leaves only the static prices; it never aborts
/// the run. An empty `coingecko_url` disables fetching.
pub async fn load_prices(config: &PriceConfig) -> PriceTable {
    let mut table = PriceTable::new();

    if !config.coingecko_url.is_empty() {
        let source = CoinGeckoPrices::new()
            .with_base_url(config.coingecko_url.as_str())
            .with_quote_currency(config.quote_currency.as_str())
            .with_custom_mappings(config.mappings.clone());
        match source.fetch().await {
            Ok(fetched) => table.extend(fetched),
            Err(err) => tracing::warn!(error = %err, "failed to load prices; continuing without them"),
        }
    }

    for (symbol, price) in &config.static_prices {
        table.insert(symbol, *price);
    }
    table
}

const BUILTIN_IDS: &[(&str, &str)] = &[
    ("ATOM", "cosmos"),
    ("OSMO", "osmosis"),
    ("JUNO", "juno-network"),
    ("STARS", "stargaze"),
    ("AKT", "akash-network"),
    ("SCRT", "secret"),
    ("INJ", "injective-protocol"),
    ("TIA", "celestia"),
    ("DYDX", "dydx-chain"),
    ("NTRN", "neutron-3"),
    ("STRD", "stride"),
    ("EVMOS", "evmos"),
    ("KAVA", "kava"),
    ("LUNA", "terra-luna-2"),
    ("CRO", "crypto-com-chain"),
    ("AXL", "axelar"),
    ("SAGA", "saga-2"),
    ("DYM", "dymension"),
    ("REGEN", "regen"),
    ("BLD", "agoric"),
    ("UMEE", "umee"),
    ("HUAHUA", "chihuahua-token"),
    ("BAND", "band-protocol"),
    ("CMDX", "comdex"),
    ("SOMM", "sommelier"),
    ("ARCH", "archway"),
    ("STATOM", "stride-staked-atom"),
    ("USDC", "usd-coin"),
    ("USDT", "tether"),
];
