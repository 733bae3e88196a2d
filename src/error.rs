//! Error types for the aggregation engine.
//!
//! Every failure here is scoped: it affects one registry lookup, one query
//! category, or one (network, address) pair. None of them abort an
//! aggregation run.

use crate::models::NetworkKey;

/// Failure to load chain metadata or an asset list from the registry.
///
/// A failed lookup is never cached; the next caller fetches again.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request for {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode registry document {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a single chain REST query (bank, staking or rewards).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("gateway returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure converting an account address between bech32 prefixes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid bech32 address {address:?}: {reason}")]
    Decode { address: String, reason: String },

    #[error("invalid bech32 prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    #[error("failed to encode address with prefix {prefix:?}: {reason}")]
    Encode { prefix: String, reason: String },
}

/// Reason a (network, address) pair produced no records at all.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("chain info for {network} unavailable: {source}")]
    Registry {
        network: NetworkKey,
        #[source]
        source: RegistryError,
    },

    #[error("no healthy REST endpoint for {network}")]
    NoHealthyEndpoint { network: NetworkKey },

    #[error("skipping {address} on {network}: {source}")]
    SkippedPair {
        network: NetworkKey,
        address: String,
        #[source]
        source: AddressError,
    },
}
