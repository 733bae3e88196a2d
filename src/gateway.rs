//! Client for the Cosmos SDK REST (LCD) balance endpoints.

use std::collections::BTreeMap;
use std::time::Duration;

use num_bigint::BigUint;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::models::{Category, Coin};

pub const BANK_BALANCES_PATH: &str = "/cosmos/bank/v1beta1/balances";
pub const DELEGATIONS_PATH: &str = "/cosmos/staking/v1beta1/delegations";

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn rewards_path(address: &str) -> String {
    format!("/cosmos/distribution/v1beta1/delegators/{address}/rewards")
}

#[derive(Debug, Deserialize)]
struct BankBalancesResponse {
    #[serde(default)]
    balances: Vec<Coin>,
}

#[derive(Debug, Deserialize)]
struct DelegationsResponse {
    #[serde(default)]
    delegation_responses: Vec<DelegationResponse>,
}

#[derive(Debug, Deserialize)]
struct DelegationResponse {
    balance: Coin,
}

#[derive(Debug, Deserialize)]
struct RewardsResponse {
    #[serde(default)]
    rewards: Vec<ValidatorReward>,
}

#[derive(Debug, Deserialize)]
struct ValidatorReward {
    #[serde(default)]
    reward: Vec<Coin>,
}

#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    timeout: Duration,
}

impl RestGateway {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queries one balance category for `address` against `endpoint`.
    pub async fn query(
        &self,
        category: Category,
        endpoint: &str,
        address: &str,
    ) -> Result<Vec<Coin>, GatewayError> {
        match category {
            Category::Bank => self.bank_balances(endpoint, address).await,
            Category::Staking => self.delegations(endpoint, address).await,
            Category::Rewards => self.rewards(endpoint, address).await,
        }
    }

    pub async fn bank_balances(
        &self,
        endpoint: &str,
        address: &str,
    ) -> Result<Vec<Coin>, GatewayError> {
        let url = format!("{endpoint}{BANK_BALANCES_PATH}/{address}");
        let response: BankBalancesResponse = self.get_json(&url).await?;
        Ok(response.balances)
    }

    /// One entry per delegation; the same denom may appear several times.
    pub async fn delegations(
        &self,
        endpoint: &str,
        address: &str,
    ) -> Result<Vec<Coin>, GatewayError> {
        let url = format!("{endpoint}{DELEGATIONS_PATH}/{address}");
        let response: DelegationsResponse = self.get_json(&url).await?;
        Ok(response
            .delegation_responses
            .into_iter()
            .map(|delegation| delegation.balance)
            .collect())
    }

    /// Pending rewards summed across validators, one entry per denom.
    pub async fn rewards(&self, endpoint: &str, address: &str) -> Result<Vec<Coin>, GatewayError> {
        let url = format!("{endpoint}{}", rewards_path(address));
        let response: RewardsResponse = self.get_json(&url).await?;
        Ok(sum_rewards(&response.rewards))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| GatewayError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for RestGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Fractional digits of a Cosmos SDK `Dec`, the type of reward amounts.
const DEC_PRECISION: usize = 18;

/// Sums rewards per denom, exactly, at `Dec` precision.
///
/// A coin whose amount cannot be read is dropped on its own; the other coins,
/// including other rewards in the same denom, are kept.
fn sum_rewards(rewards: &[ValidatorReward]) -> Vec<Coin> {
    let mut totals: BTreeMap<&str, BigUint> = BTreeMap::new();
    for coin in rewards.iter().flat_map(|validator| &validator.reward) {
        let Some(amount) = parse_dec(&coin.amount) else {
            tracing::warn!(
                denom = %coin.denom,
                amount = %coin.amount,
                "skipping unparseable reward amount"
            );
            continue;
        };
        *totals.entry(coin.denom.as_str()).or_default() += amount;
    }

    totals
        .into_iter()
        .map(|(denom, total)| Coin::new(denom, format_dec(&total)))
        .collect()
}

/// Reads a non-negative decimal string as an integer count of `10^-18` units.
fn parse_dec(amount: &str) -> Option<BigUint> {
    let amount = amount.trim();
    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    if int_part.is_empty() || frac_part.len() > DEC_PRECISION {
        return None;
    }

    let digits = format!("{int_part}{frac_part:0<width$}", width = DEC_PRECISION);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
}

fn format_dec(value: &BigUint) -> String {
    let digits = value.to_string();
    let digits = format!("{digits:0>width$}", width = DEC_PRECISION + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - DEC_PRECISION);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}
