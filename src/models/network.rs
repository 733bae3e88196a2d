use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a chain by its registry slug (e.g. `osmosis`, `cosmoshub`).
///
/// Used as the cache key for chain metadata and asset lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkKey(String);

impl NetworkKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for NetworkKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NetworkKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for NetworkKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// One unit of aggregation work: a network and a canonical account address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    pub network: NetworkKey,
    /// Canonical bech32 address; rewritten to the network's prefix before querying.
    pub address: String,
    /// Overrides the registry's bech32 prefix when set.
    pub prefix: Option<String>,
}

impl QueryPair {
    pub fn new(network: impl Into<NetworkKey>, address: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}
