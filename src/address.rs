//! Account address conversion between chains.
//!
//! Cosmos chains share the same 20-byte account payload and differ only in
//! the bech32 human-readable prefix, so one canonical address can be queried
//! on every chain after re-encoding.

use bech32::{Bech32, Hrp};

use crate::error::AddressError;

pub trait AddressConverter: Send + Sync {
    /// Re-encodes `address` under `prefix`.
    fn to_network(&self, address: &str, prefix: &str) -> Result<String, AddressError>;

    /// Hex of the address payload, or an empty string if it cannot be decoded.
    fn to_hex(&self, address: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bech32Converter;

impl AddressConverter for Bech32Converter {
    fn to_network(&self, address: &str, prefix: &str) -> Result<String, AddressError> {
        let (_, data) = bech32::decode(address).map_err(|err| AddressError::Decode {
            address: address.to_string(),
            reason: err.to_string(),
        })?;

        let hrp = Hrp::parse(prefix).map_err(|err| AddressError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: err.to_string(),
        })?;

        bech32::encode::<Bech32>(hrp, &data).map_err(|err| AddressError::Encode {
            prefix: prefix.to_string(),
            reason: err.to_string(),
        })
    }

    fn to_hex(&self, address: &str) -> String {
        bech32::decode(address)
            .map(|(_, data)| hex::encode(data))
            .unwrap_or_default()
    }
}
