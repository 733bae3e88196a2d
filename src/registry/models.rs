use serde::{Deserialize, Serialize};

/// Subset of a chain registry `chain.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainInfo {
    pub chain_name: String,
    pub bech32_prefix: String,
    pub apis: Apis,
}

impl ChainInfo {
    /// Candidate REST gateways in registry order.
    pub fn rest_endpoints(&self) -> &[RestEndpoint] {
        &self.apis.rest
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Apis {
    pub rest: Vec<RestEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestEndpoint {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl RestEndpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            provider: None,
        }
    }
}

/// Subset of a chain registry `assetlist.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetList {
    pub chain_name: String,
    pub assets: Vec<AssetEntry>,
}

impl AssetList {
    /// Finds the asset whose base denom is `denom`.
    pub fn find_base(&self, denom: &str) -> Option<&AssetEntry> {
        self.assets.iter().find(|asset| asset.base == denom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetEntry {
    pub base: String,
    pub display: String,
    pub symbol: String,
    pub denom_units: Vec<DenomUnit>,
}

impl AssetEntry {
    /// Exponent of the unit named by `display`, if listed.
    pub fn display_exponent(&self) -> Option<u32> {
        self.denom_units
            .iter()
            .find(|unit| unit.denom == self.display)
            .map(|unit| unit.exponent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
}
