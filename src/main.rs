use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cosmoscope::address::Bech32Converter;
use cosmoscope::aggregate::Aggregator;
use cosmoscope::config::{default_config_path, Config};
use cosmoscope::denom::DenomResolver;
use cosmoscope::endpoint::EndpointSelector;
use cosmoscope::gateway::RestGateway;
use cosmoscope::orchestrator::QueryOrchestrator;
use cosmoscope::price::{load_prices, PriceConverter};
use cosmoscope::registry::{ChainRegistry, RegistryCache};
use cosmoscope::report;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cosmoscope")]
#[command(about = "Balance report across Cosmos chains")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print records as JSON lines instead of a table
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    if let Some(Command::Config) = cli.command {
        println!("# Config file: {}", config_path.display());
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let prices: Arc<dyn PriceConverter> = Arc::new(load_prices(&config.prices).await);
    let client = reqwest::Client::new();

    let registry: Arc<dyn ChainRegistry> = Arc::new(
        RegistryCache::with_client(client.clone())
            .with_base_url(config.registry_url.as_str())
            .with_timeout(config.timeouts.query),
    );
    let selector = EndpointSelector::with_client(client.clone())
        .with_probe_timeout(config.timeouts.probe)
        .with_deadline(config.timeouts.endpoint_deadline);
    let orchestrator = QueryOrchestrator::new(
        RestGateway::with_client(client).with_timeout(config.timeouts.query),
        DenomResolver::new(Arc::clone(&registry)),
        Arc::clone(&prices),
    );
    let aggregator = Aggregator::new(registry, selector, orchestrator, Arc::new(Bech32Converter))
        .with_capacity(config.channel_capacity);

    let aggregation = aggregator.aggregate(config.query_pairs());
    let mut records = report::collect(aggregation.records).await;
    records.extend(
        config
            .fixed_balances
            .iter()
            .map(|fixed| fixed.to_record(prices.as_ref())),
    );
    report::sort_records(&mut records);

    if cli.json {
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    let quote = config.prices.quote_currency.as_str();
    println!(
        "BALANCES REPORT ({})\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", report::render_table(&records, quote));
    println!("{}", report::render_summary(&report::summarize(&records), quote));

    Ok(())
}
