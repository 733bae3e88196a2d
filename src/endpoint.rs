//! REST endpoint selection by racing health probes.
//!
//! Every candidate is probed concurrently and the first one to answer the
//! node-info request with `200 OK` wins. Probes still in flight when a winner
//! is found (or the deadline passes) are detached, not aborted: they run to
//! completion in the background and their results are dropped.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::mpsc;

use crate::registry::RestEndpoint;

/// Low-cost status endpoint every Cosmos SDK REST gateway serves.
pub const HEALTH_PATH: &str = "/cosmos/base/tendermint/v1beta1/node_info";

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_DEADLINE: Duration = Duration::from_secs(3);

/// Picks one reachable REST gateway out of a candidate list.
///
/// Selection carries no state between calls; each call re-probes from scratch.
#[derive(Debug, Clone)]
pub struct EndpointSelector {
    client: reqwest::Client,
    probe_timeout: Duration,
    deadline: Duration,
}

impl EndpointSelector {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Per-probe request timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Overall budget for one [`select`](Self::select) call.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the base URL of the first candidate to pass its health probe.
    ///
    /// Returns `None` when there are no candidates, every probe fails, or the
    /// deadline elapses first. Ties are broken by arrival order, not by the
    /// candidate's position in the list.
    pub async fn select(&self, candidates: &[RestEndpoint]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let (tx, mut rx) = mpsc::channel(candidates.len());
        for candidate in candidates {
            let address = candidate.address.trim_end_matches('/').to_string();
            let client = self.client.clone();
            let timeout = self.probe_timeout;
            let tx = tx.clone();
            tokio::spawn(async move {
                let healthy = probe(&client, &address, timeout).await;
                // The receiver is gone once a winner is chosen or the deadline passes.
                let _ = tx.send((address, healthy)).await;
            });
        }
        drop(tx);

        let first_healthy = async {
            while let Some((address, healthy)) = rx.recv().await {
                if healthy {
                    return Some(address);
                }
            }
            None
        };

        match tokio::time::timeout(self.deadline, first_healthy).await {
            Ok(Some(address)) => {
                tracing::debug!(endpoint = %address, "selected REST endpoint");
                Some(address)
            }
            Ok(None) => {
                tracing::debug!(candidates = candidates.len(), "all endpoint probes failed");
                None
            }
            Err(_) => {
                tracing::debug!(
                    candidates = candidates.len(),
                    deadline = ?self.deadline,
                    "endpoint selection deadline elapsed"
                );
                None
            }
        }
    }
}

impl Default for EndpointSelector {
    fn default() -> Self {
        Self::new()
    }
}

async fn probe(client: &reqwest::Client, address: &str, timeout: Duration) -> bool {
    let url = format!("{address}{HEALTH_PATH}");
    match client.get(&url).timeout(timeout).send().await {
        Ok(response) if response.status() == StatusCode::OK => true,
        Ok(response) => {
            tracing::debug!(endpoint = %address, status = %response.status(), "probe rejected");
            false
        }
        Err(err) => {
            tracing::debug!(endpoint = %address, error = %err, "probe failed");
            false
        }
    }
}
