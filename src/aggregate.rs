//! Fan-out/fan-in over (network, address) pairs.
//!
//! Each pair runs as an independent task that writes into one bounded stream.
//! A supervisor task owns the original sender and drops it only after every
//! worker has finished, so the stream closes exactly when the last worker is
//! done and no record can arrive after closure.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::address::AddressConverter;
use crate::endpoint::EndpointSelector;
use crate::error::AggregateError;
use crate::models::{BalanceRecord, QueryPair};
use crate::orchestrator::{AccountAddress, QueryOrchestrator};
use crate::registry::ChainRegistry;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

struct Shared {
    registry: Arc<dyn ChainRegistry>,
    selector: EndpointSelector,
    orchestrator: QueryOrchestrator,
    addresses: Arc<dyn AddressConverter>,
}

impl Shared {
    async fn run_pair(
        &self,
        pair: &QueryPair,
        sink: &mpsc::Sender<BalanceRecord>,
    ) -> Result<usize, AggregateError> {
        let chain = self
            .registry
            .chain_info(&pair.network)
            .await
            .map_err(|source| AggregateError::Registry {
                network: pair.network.clone(),
                source,
            })?;

        let prefix = pair.prefix.as_deref().unwrap_or(&chain.bech32_prefix);
        let address = self
            .addresses
            .to_network(&pair.address, prefix)
            .map_err(|source| AggregateError::SkippedPair {
                network: pair.network.clone(),
                address: pair.address.clone(),
                source,
            })?;
        let account = AccountAddress {
            hex_address: self.addresses.to_hex(&address),
            address,
        };

        let endpoint = self
            .selector
            .select(chain.rest_endpoints())
            .await
            .ok_or_else(|| AggregateError::NoHealthyEndpoint {
                network: pair.network.clone(),
            })?;

        Ok(self
            .orchestrator
            .run(&pair.network, &account, &endpoint, sink)
            .await)
    }
}

/// Outcome counts for one aggregation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    pub pairs: usize,
    pub failed: usize,
    pub records: usize,
}

/// Handle to a running aggregation.
pub struct Aggregation {
    /// Normalized records in arrival order; closes once every worker is done.
    pub records: mpsc::Receiver<BalanceRecord>,
    supervisor: tokio::task::JoinHandle<AggregateSummary>,
}

impl Aggregation {
    /// Waits for the supervisor and returns the run's counts.
    ///
    /// Records not yet received are discarded and stop the remaining workers.
    /// If the supervisor itself died, the counts are unknown and all zero.
    pub async fn summary(self) -> AggregateSummary {
        drop(self.records);
        match self.supervisor.await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(error = %err, "aggregation supervisor failed; counts unavailable");
                AggregateSummary::default()
            }
        }
    }
}

pub struct Aggregator {
    shared: Arc<Shared>,
    capacity: usize,
}

impl Aggregator {
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        selector: EndpointSelector,
        orchestrator: QueryOrchestrator,
        addresses: Arc<dyn AddressConverter>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                selector,
                orchestrator,
                addresses,
            }),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Capacity of the result stream.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Spawns one worker per pair and returns the merged result stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn aggregate(&self, pairs: Vec<QueryPair>) -> Aggregation {
        let (tx, rx) = mpsc::channel(self.capacity);
        let total = pairs.len();
        tracing::info!(pairs = total, "starting balance aggregation");

        let mut workers = JoinSet::new();
        for pair in pairs {
            let shared = Arc::clone(&self.shared);
            let tx = tx.clone();
            workers.spawn(async move {
                let result = shared.run_pair(&pair, &tx).await;
                (pair, result)
            });
        }

        let supervisor = tokio::spawn(async move {
            let mut summary = AggregateSummary {
                pairs: total,
                ..Default::default()
            };
            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok((_, Ok(count))) => summary.records += count,
                    Ok((pair, Err(err))) => {
                        summary.failed += 1;
                        tracing::warn!(
                            network = %pair.network,
                            address = %pair.address,
                            error = %err,
                            "pair skipped"
                        );
                    }
                    Err(err) => {
                        summary.failed += 1;
                        tracing::warn!(error = %err, "balance worker panicked");
                    }
                }
            }

            // Last sender: every worker has dropped its clone by now.
            drop(tx);
            tracing::info!(
                pairs = summary.pairs,
                failed = summary.failed,
                records = summary.records,
                "balance aggregation finished"
            );
            summary
        });

        Aggregation {
            records: rx,
            supervisor,
        }
    }
}
