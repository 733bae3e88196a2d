//! Per-(network, address) balance queries.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::denom::{scale_amount, DenomResolver};
use crate::gateway::RestGateway;
use crate::models::{BalanceRecord, Category, Coin, NetworkKey};
use crate::price::PriceConverter;

/// An account address in the form used on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAddress {
    /// Address with the network's bech32 prefix.
    pub address: String,
    /// Hex of the address payload, attached to records for display.
    pub hex_address: String,
}

/// Issues bank, staking and rewards queries for one account on one network and
/// streams normalized records to the collector.
///
/// Staking and rewards are only queried when the bank query returned at least
/// one balance; an account with no liquid balance is treated as inactive on
/// that chain.
pub struct QueryOrchestrator {
    gateway: RestGateway,
    resolver: DenomResolver,
    prices: Arc<dyn PriceConverter>,
}

impl QueryOrchestrator {
    pub fn new(
        gateway: RestGateway,
        resolver: DenomResolver,
        prices: Arc<dyn PriceConverter>,
    ) -> Self {
        Self {
            gateway,
            resolver,
            prices,
        }
    }

    /// Runs every category against `endpoint`. Returns the number of records sent.
    ///
    /// Query failures degrade to "no balances" for that category. Stops early
    /// if the collector has gone away.
    pub async fn run(
        &self,
        network: &NetworkKey,
        account: &AccountAddress,
        endpoint: &str,
        sink: &mpsc::Sender<BalanceRecord>,
    ) -> usize {
        let bank = self.fetch(Category::Bank, network, account, endpoint).await;
        let Some(mut sent) = self.emit(Category::Bank, network, account, &bank, sink).await else {
            return 0;
        };

        if bank.is_empty() {
            tracing::debug!(
                network = %network,
                address = %account.address,
                "no bank balances; skipping staking and rewards"
            );
            return sent;
        }

        for category in [Category::Staking, Category::Rewards] {
            let coins = self.fetch(category, network, account, endpoint).await;
            match self.emit(category, network, account, &coins, sink).await {
                Some(count) => sent += count,
                None => return sent,
            }
        }

        sent
    }

    async fn fetch(
        &self,
        category: Category,
        network: &NetworkKey,
        account: &AccountAddress,
        endpoint: &str,
    ) -> Vec<Coin> {
        match self.gateway.query(category, endpoint, &account.address).await {
            Ok(coins) => coins,
            Err(err) => {
                tracing::warn!(
                    network = %network,
                    address = %account.address,
                    category = %category,
                    error = %err,
                    "balance query failed; treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Sends one record per coin. Returns `None` once the receiver is closed.
    async fn emit(
        &self,
        category: Category,
        network: &NetworkKey,
        account: &AccountAddress,
        coins: &[Coin],
        sink: &mpsc::Sender<BalanceRecord>,
    ) -> Option<usize> {
        let mut sent = 0;
        for coin in coins {
            let Some(record) = self.to_record(category, network, account, coin).await else {
                continue;
            };
            if sink.send(record).await.is_err() {
                tracing::debug!(network = %network, "result stream closed; stopping");
                return None;
            }
            sent += 1;
        }
        Some(sent)
    }

    async fn to_record(
        &self,
        category: Category,
        network: &NetworkKey,
        account: &AccountAddress,
        coin: &Coin,
    ) -> Option<BalanceRecord> {
        let denom = self.resolver.resolve(network, &coin.denom).await;
        let Some(amount) = scale_amount(&coin.amount, denom.exponent) else {
            tracing::warn!(
                network = %network,
                category = %category,
                denom = %coin.denom,
                amount = %coin.amount,
                "skipping unparseable amount"
            );
            return None;
        };

        let usd_value = self.prices.usd_value(&denom.symbol, amount);
        Some(BalanceRecord {
            network: category.label(network),
            account: account.address.clone(),
            hex_address: account.hex_address.clone(),
            token: denom.symbol,
            amount,
            usd_value,
            decimals: denom.exponent,
        })
    }
}
