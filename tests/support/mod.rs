#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bech32::{Bech32, Hrp};
use cosmoscope::address::Bech32Converter;
use cosmoscope::aggregate::Aggregator;
use cosmoscope::denom::DenomResolver;
use cosmoscope::endpoint::{EndpointSelector, HEALTH_PATH};
use cosmoscope::gateway::{rewards_path, RestGateway, BANK_BALANCES_PATH, DELEGATIONS_PATH};
use cosmoscope::orchestrator::QueryOrchestrator;
use cosmoscope::price::PriceTable;
use cosmoscope::registry::{ChainRegistry, RegistryCache};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn bech32_address(prefix: &str, payload: &[u8]) -> String {
    bech32::encode::<Bech32>(Hrp::parse(prefix).unwrap(), payload).unwrap()
}

pub fn chain_body(network: &str, prefix: &str, rest: &[String]) -> Value {
    let rest: Vec<Value> = rest.iter().map(|address| json!({ "address": address })).collect();
    json!({
        "chain_name": network,
        "bech32_prefix": prefix,
        "apis": { "rest": rest }
    })
}

pub fn bank_body(coins: &[(&str, &str)]) -> Value {
    let balances: Vec<Value> = coins
        .iter()
        .map(|(denom, amount)| json!({ "denom": denom, "amount": amount }))
        .collect();
    json!({ "balances": balances, "pagination": { "next_key": null, "total": "0" } })
}

pub fn delegations_body(coins: &[(&str, &str)]) -> Value {
    let delegations: Vec<Value> = coins
        .iter()
        .map(|(denom, amount)| {
            json!({
                "delegation": { "validator_address": "cosmosvaloper1xyz", "shares": amount },
                "balance": { "denom": denom, "amount": amount }
            })
        })
        .collect();
    json!({ "delegation_responses": delegations })
}

pub fn rewards_body(validators: &[&[(&str, &str)]]) -> Value {
    let rewards: Vec<Value> = validators
        .iter()
        .enumerate()
        .map(|(i, coins)| {
            let reward: Vec<Value> = coins
                .iter()
                .map(|(denom, amount)| json!({ "denom": denom, "amount": amount }))
                .collect();
            json!({ "validator_address": format!("cosmosvaloper1v{i}"), "reward": reward })
        })
        .collect();
    json!({ "rewards": rewards, "total": [] })
}

pub async fn mount_chain(registry: &MockServer, network: &str, prefix: &str, rest: &[String]) {
    Mock::given(method("GET"))
        .and(path(format!("/{network}/chain.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(chain_body(network, prefix, rest)))
        .mount(registry)
        .await;
}

pub async fn mount_healthy(gateway: &MockServer) {
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_node_info": {} })))
        .mount(gateway)
        .await;
}

pub async fn mount_bank(gateway: &MockServer, address: &str, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{BANK_BALANCES_PATH}/{address}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(gateway)
        .await;
}

pub async fn mount_delegations(gateway: &MockServer, address: &str, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{DELEGATIONS_PATH}/{address}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(gateway)
        .await;
}

pub async fn mount_rewards(gateway: &MockServer, address: &str, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(rewards_path(address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(gateway)
        .await;
}

pub fn registry(registry_url: &str) -> Arc<dyn ChainRegistry> {
    Arc::new(
        RegistryCache::new()
            .with_base_url(registry_url)
            .with_timeout(Duration::from_secs(2)),
    )
}

pub fn orchestrator(registry: Arc<dyn ChainRegistry>, prices: PriceTable) -> QueryOrchestrator {
    QueryOrchestrator::new(
        RestGateway::new().with_timeout(Duration::from_secs(2)),
        DenomResolver::new(registry),
        Arc::new(prices),
    )
}

pub fn fast_selector() -> EndpointSelector {
    EndpointSelector::new()
        .with_probe_timeout(Duration::from_millis(500))
        .with_deadline(Duration::from_millis(800))
}

pub fn aggregator(registry_url: &str, prices: PriceTable) -> Aggregator {
    let registry = registry(registry_url);
    Aggregator::new(
        Arc::clone(&registry),
        fast_selector(),
        orchestrator(registry, prices),
        Arc::new(Bech32Converter),
    )
}
