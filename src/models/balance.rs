use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::NetworkKey;

/// Which module of the chain a balance was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bank,
    Staking,
    Rewards,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bank => "bank",
            Category::Staking => "staking",
            Category::Rewards => "rewards",
        }
    }

    /// Display label for a network/category pair, e.g. `osmosis-staking`.
    pub fn label(&self, network: &NetworkKey) -> String {
        format!("{}-{}", network, self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw on-chain amount of one denom, as returned by the REST gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    /// Integer base units, or a decimal string for reward (DecCoin) amounts.
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

/// A normalized balance, emitted once onto the result stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Network plus category suffix, e.g. `osmosis-bank`.
    pub network: String,
    pub account: String,
    /// Hex encoding of the address payload; empty when it could not be derived.
    pub hex_address: String,
    pub token: String,
    pub amount: Decimal,
    pub usd_value: Decimal,
    /// Exponent used to scale the raw amount into `amount`.
    pub decimals: u32,
}
