//! Read-mostly cache over the chain registry.
//!
//! Documents are fetched lazily on first lookup and kept for the lifetime of
//! the cache. Concurrent misses for the same network may each fetch; the last
//! write wins, which is harmless because the documents are identical.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::{AssetList, ChainInfo, ChainRegistry};
use crate::error::RegistryError;
use crate::models::NetworkKey;

pub const REGISTRY_BASE_URL: &str = "https://raw.githubusercontent.com/cosmos/chain-registry/master";

const CHAIN_FILE: &str = "chain.json";
const ASSETLIST_FILE: &str = "assetlist.json";

type Slot<T> = RwLock<HashMap<NetworkKey, Arc<T>>>;

/// HTTP-backed [`ChainRegistry`] that memoizes every successful lookup.
pub struct RegistryCache {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    chains: Slot<ChainInfo>,
    asset_lists: Slot<AssetList>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: REGISTRY_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            chains: RwLock::new(HashMap::new()),
            asset_lists: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn document_url(&self, network: &NetworkKey, file: &str) -> String {
        format!("{}/{}/{}", self.base_url, network, file)
    }

    async fn cached<T: DeserializeOwned>(
        &self,
        slot: &Slot<T>,
        network: &NetworkKey,
        file: &str,
    ) -> Result<Arc<T>, RegistryError> {
        let hit = slot.read().await.get(network).cloned();
        if let Some(hit) = hit {
            tracing::debug!(network = %network, file, "registry cache hit");
            return Ok(hit);
        }

        let url = self.document_url(network, file);
        tracing::debug!(network = %network, url = %url, "registry cache miss");
        let value = Arc::new(self.fetch::<T>(&url).await?);

        slot.write().await.insert(network.clone(), Arc::clone(&value));
        Ok(value)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, RegistryError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| RegistryError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for RegistryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChainRegistry for RegistryCache {
    async fn chain_info(&self, network: &NetworkKey) -> Result<Arc<ChainInfo>, RegistryError> {
        self.cached(&self.chains, network, CHAIN_FILE).await
    }

    async fn asset_list(&self, network: &NetworkKey) -> Result<Arc<AssetList>, RegistryError> {
        self.cached(&self.asset_lists, network, ASSETLIST_FILE).await
    }
}
