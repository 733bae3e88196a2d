//! Chain registry access: chain metadata and asset lists per network.

mod cache;
mod models;

use std::sync::Arc;

use crate::error::RegistryError;
use crate::models::NetworkKey;

pub use cache::{RegistryCache, REGISTRY_BASE_URL};
pub use models::{Apis, AssetEntry, AssetList, ChainInfo, DenomUnit, RestEndpoint};

/// Get-or-fetch access to registry documents.
///
/// Implementations must be safe to share across workers; the engine holds one
/// instance behind an `Arc` for the whole run.
#[async_trait::async_trait]
pub trait ChainRegistry: Send + Sync {
    async fn chain_info(&self, network: &NetworkKey) -> Result<Arc<ChainInfo>, RegistryError>;

    async fn asset_list(&self, network: &NetworkKey) -> Result<Arc<AssetList>, RegistryError>;
}
