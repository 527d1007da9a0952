//! Token Sentry - one-shot scan CLI
//!
//! Loads a token context snapshot from the context directory, runs the full
//! detector pipeline, publishes the result to an in-process registry and
//! prints the aggregate report.
//!
//! Usage:
//!   token_sentry <0xTOKEN_ADDRESS>
//!
//! Environment:
//!   SENTRY_CONTEXT_DIR    - Directory of <address>.json snapshots
//!   SENTRY_OWNER_ADDRESS  - Registry owner principal
//!   RUST_LOG              - Log level (default: info)

use std::sync::Arc;

use eyre::{eyre, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use token_sentry::{
    parse_token_address, FileProvider, IdentityRegistryClient, NullIdentityRegistry,
    RegistryConfig, RiskAggregator, RiskPublisher, RiskRegistry, SentryConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let raw_address = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("Usage: token_sentry <0xTOKEN_ADDRESS>"))?;
    let token = parse_token_address(&raw_address).map_err(|e| eyre!("{}", e))?;

    let config = SentryConfig::default();
    info!("🔍 Token Sentry scanning {}", token);
    info!("📂 Context dir: {}", config.context_dir);

    let provider = Arc::new(FileProvider::new(&config.context_dir));
    let registry = Arc::new(RiskRegistry::new(
        RegistryConfig::new(config.owner).with_staleness_secs(config.staleness_secs),
    ));
    if config.agent != config.owner {
        registry
            .authorize_agent(config.owner, config.agent)
            .map_err(|e| eyre!("{}", e))?;
    }

    let identity = Arc::new(NullIdentityRegistry);
    let agent_id = identity
        .register_agent(config.agent, "token-sentry", "")
        .await
        .map_err(|e| eyre!("{}", e))?;

    let publisher = RiskPublisher::new(
        RiskAggregator::new(provider),
        registry.clone(),
        config.agent,
    )
    .with_identity(identity, agent_id);

    let outcome = publisher
        .scan_and_publish(token)
        .await
        .map_err(|e| eyre!("{}", e))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    let report = &outcome.report;
    info!(
        "✅ {} scored {} ({}) in {:.2}s, published={}",
        token,
        report.overall_risk,
        report.risk_level.as_str(),
        report.scan_duration_seconds,
        outcome.published
    );
    for event in registry.events() {
        info!("📋 {:?}", event);
    }

    Ok(())
}
