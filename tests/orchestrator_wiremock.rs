mod support;

use std::str::FromStr;

use anyhow::Result;
use cosmoscope::gateway::{BANK_BALANCES_PATH, DELEGATIONS_PATH};
use cosmoscope::models::{BalanceRecord, NetworkKey};
use cosmoscope::orchestrator::{AccountAddress, QueryOrchestrator};
use cosmoscope::price::PriceTable;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADDRESS: &str = "test1qqqsyqcyq5rqwzqfpg9scrgwpugpzysn7hzdtn";

fn account() -> AccountAddress {
    AccountAddress {
        address: ADDRESS.to_string(),
        hex_address: "00010203".to_string(),
    }
}

async fn run(
    orchestrator: &QueryOrchestrator,
    network: &str,
    endpoint: &str,
) -> (usize, Vec<BalanceRecord>) {
    let (tx, mut rx) = mpsc::channel(100);
    let sent = orchestrator
        .run(&NetworkKey::from(network), &account(), endpoint, &tx)
        .await;
    drop(tx);

    let mut records = Vec::new();
    while let Some(record) = rx.recv().await {
        records.push(record);
    }
    (sent, records)
}

/// Registry server with nothing mounted: every asset list lookup is a 404.
async fn empty_registry() -> MockServer {
    MockServer::start().await
}

#[tokio::test]
async fn bank_balance_without_asset_list_uses_heuristic() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    support::mount_bank(&gateway, ADDRESS, support::bank_body(&[("utest", "1000000")]), 1).await;
    support::mount_delegations(&gateway, ADDRESS, support::delegations_body(&[]), 1).await;
    support::mount_rewards(&gateway, ADDRESS, support::rewards_body(&[]), 1).await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (sent, records) = run(&orchestrator, "testchain", &gateway.uri()).await;

    assert_eq!(sent, 1);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.network, "testchain-bank");
    assert_eq!(record.account, ADDRESS);
    assert_eq!(record.hex_address, "00010203");
    assert_eq!(record.token, "TEST");
    assert_eq!(record.amount, Decimal::ONE);
    assert_eq!(record.decimals, 6);
    assert_eq!(record.usd_value, Decimal::ZERO);

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn empty_bank_skips_staking_and_rewards() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    support::mount_bank(&gateway, ADDRESS, support::bank_body(&[]), 1).await;
    support::mount_delegations(&gateway, ADDRESS, support::delegations_body(&[("uatom", "5")]), 0)
        .await;
    support::mount_rewards(&gateway, ADDRESS, support::rewards_body(&[]), 0).await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (sent, records) = run(&orchestrator, "testchain", &gateway.uri()).await;

    assert_eq!(sent, 0);
    assert!(records.is_empty());

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn failed_bank_query_counts_as_empty() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{BANK_BALANCES_PATH}/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gateway)
        .await;
    support::mount_delegations(&gateway, ADDRESS, support::delegations_body(&[]), 0).await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (sent, records) = run(&orchestrator, "testchain", &gateway.uri()).await;

    assert_eq!(sent, 0);
    assert!(records.is_empty());

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn rewards_are_aggregated_across_validators() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    support::mount_bank(&gateway, ADDRESS, support::bank_body(&[("uatom", "1")]), 1).await;
    support::mount_delegations(&gateway, ADDRESS, support::delegations_body(&[]), 1).await;
    support::mount_rewards(
        &gateway,
        ADDRESS,
        support::rewards_body(&[&[("uatom", "500000")], &[("uatom", "250000")]]),
        1,
    )
    .await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (_, records) = run(&orchestrator, "cosmoshub", &gateway.uri()).await;

    let rewards: Vec<&BalanceRecord> = records
        .iter()
        .filter(|r| r.network == "cosmoshub-rewards")
        .collect();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].token, "ATOM");
    // 750000 base units scaled by 10^6.
    assert_eq!(rewards[0].amount, Decimal::from_str("0.75")?);
    assert_eq!(rewards[0].decimals, 6);

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn categories_are_labelled_and_priced() -> Result<()> {
    let registry = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/osmosis/assetlist.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chain_name": "osmosis",
            "assets": [{
                "base": "uosmo",
                "display": "osmo",
                "symbol": "OSMO",
                "denom_units": [{ "denom": "uosmo", "exponent": 0 }, { "denom": "osmo", "exponent": 6 }]
            }]
        })))
        .expect(1)
        .mount(&registry)
        .await;

    let gateway = MockServer::start().await;
    support::mount_bank(&gateway, ADDRESS, support::bank_body(&[("uosmo", "2000000")]), 1).await;
    support::mount_delegations(
        &gateway,
        ADDRESS,
        support::delegations_body(&[("uosmo", "10000000"), ("uosmo", "5000000")]),
        1,
    )
    .await;
    support::mount_rewards(
        &gateway,
        ADDRESS,
        support::rewards_body(&[&[("uosmo", "123456.789000000000000000")]]),
        1,
    )
    .await;

    let prices = PriceTable::new().with_price("OSMO", Decimal::from_str("0.5")?);
    let orchestrator = support::orchestrator(support::registry(&registry.uri()), prices);
    let (sent, records) = run(&orchestrator, "osmosis", &gateway.uri()).await;

    assert_eq!(sent, 4);
    let labels: Vec<&str> = records.iter().map(|r| r.network.as_str()).collect();
    assert_eq!(
        labels,
        vec!["osmosis-bank", "osmosis-staking", "osmosis-staking", "osmosis-rewards"]
    );

    assert_eq!(records[0].amount, Decimal::from(2));
    assert_eq!(records[0].usd_value, Decimal::ONE);
    assert_eq!(records[1].amount, Decimal::from(10));
    assert_eq!(records[1].usd_value, Decimal::from(5));
    assert_eq!(records[3].amount, Decimal::from_str("0.123456789")?);
    assert!(records.iter().all(|r| r.token == "OSMO" && r.decimals == 6));

    // The asset list is fetched once and reused for every denom.
    registry.verify().await;
    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn staking_failure_does_not_block_rewards() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    support::mount_bank(&gateway, ADDRESS, support::bank_body(&[("ujuno", "1000000")]), 1).await;
    Mock::given(method("GET"))
        .and(path(format!("{DELEGATIONS_PATH}/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&gateway)
        .await;
    support::mount_rewards(
        &gateway,
        ADDRESS,
        support::rewards_body(&[&[("ujuno", "3000000")]]),
        1,
    )
    .await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (sent, records) = run(&orchestrator, "juno", &gateway.uri()).await;

    assert_eq!(sent, 2);
    assert_eq!(records[0].network, "juno-bank");
    assert_eq!(records[1].network, "juno-rewards");
    assert_eq!(records[1].amount, Decimal::from(3));

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn unparseable_amounts_are_dropped() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    support::mount_bank(
        &gateway,
        ADDRESS,
        support::bank_body(&[("ufoo", "lots"), ("ubar", "-5"), ("ubaz", "42000000")]),
        1,
    )
    .await;
    support::mount_delegations(&gateway, ADDRESS, support::delegations_body(&[]), 1).await;
    support::mount_rewards(&gateway, ADDRESS, support::rewards_body(&[]), 1).await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (sent, records) = run(&orchestrator, "testchain", &gateway.uri()).await;

    assert_eq!(sent, 1);
    assert_eq!(records[0].token, "BAZ");
    assert_eq!(records[0].amount, Decimal::from(42));
    Ok(())
}

#[tokio::test]
async fn raw_amounts_beyond_decimal_range_are_kept() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    // 100 billion EVMOS in atto units, past Decimal's raw range.
    let atto = "100000000000000000000000000000";
    support::mount_bank(
        &gateway,
        ADDRESS,
        support::bank_body(&[("aevmos", atto), ("uatom", "1")]),
        1,
    )
    .await;
    support::mount_delegations(&gateway, ADDRESS, support::delegations_body(&[]), 1).await;
    support::mount_rewards(
        &gateway,
        ADDRESS,
        support::rewards_body(&[
            &[("aevmos", "100000000000000000000000000000.000000000000000000")],
            &[("aevmos", "50000000000000000000000000000.000000000000000000"), ("uatom", "5")],
            &[("uatom", "not-a-number")],
        ]),
        1,
    )
    .await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (sent, records) = run(&orchestrator, "evmos", &gateway.uri()).await;

    assert_eq!(sent, 4);
    let found = |network: &str, token: &str| {
        records
            .iter()
            .find(|r| r.network == network && r.token == token)
            .map(|r| (r.amount, r.decimals))
    };
    assert_eq!(found("evmos-bank", "EVMOS"), Some((Decimal::from(100_000_000_000u64), 18)));
    assert_eq!(found("evmos-bank", "ATOM"), Some((Decimal::from_str("0.000001")?, 6)));
    assert_eq!(
        found("evmos-rewards", "EVMOS"),
        Some((Decimal::from(150_000_000_000u64), 18))
    );
    assert_eq!(found("evmos-rewards", "ATOM"), Some((Decimal::from_str("0.000005")?, 6)));

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn overflowing_fiat_value_keeps_the_record() -> Result<()> {
    let registry = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bigchain/assetlist.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chain_name": "bigchain",
            "assets": [{
                "base": "big",
                "display": "big",
                "symbol": "BIG",
                "denom_units": [{ "denom": "big", "exponent": 0 }]
            }]
        })))
        .mount(&registry)
        .await;

    let gateway = MockServer::start().await;
    support::mount_bank(
        &gateway,
        ADDRESS,
        support::bank_body(&[("big", "70000000000000000000000000000")]),
        1,
    )
    .await;
    support::mount_delegations(
        &gateway,
        ADDRESS,
        support::delegations_body(&[("big", "10")]),
        1,
    )
    .await;
    support::mount_rewards(&gateway, ADDRESS, support::rewards_body(&[]), 1).await;

    let prices = PriceTable::new().with_price("BIG", Decimal::from(2));
    let orchestrator = support::orchestrator(support::registry(&registry.uri()), prices);
    let (sent, records) = run(&orchestrator, "bigchain", &gateway.uri()).await;

    assert_eq!(sent, 2);
    assert_eq!(records[0].network, "bigchain-bank");
    assert_eq!(records[0].decimals, 0);
    assert_eq!(records[0].usd_value, Decimal::ZERO);
    assert_eq!(records[1].network, "bigchain-staking");
    assert_eq!(records[1].usd_value, Decimal::from(20));

    gateway.verify().await;
    Ok(())
}

#[tokio::test]
async fn closed_stream_stops_querying() -> Result<()> {
    let registry = empty_registry().await;
    let gateway = MockServer::start().await;

    support::mount_bank(&gateway, ADDRESS, support::bank_body(&[("utest", "1")]), 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/cosmos/(staking|distribution)/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&gateway)
        .await;

    let orchestrator =
        support::orchestrator(support::registry(&registry.uri()), PriceTable::new());
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let sent = orchestrator
        .run(&NetworkKey::from("testchain"), &account(), &gateway.uri(), &tx)
        .await;
    assert_eq!(sent, 0);

    gateway.verify().await;
    Ok(())
}
