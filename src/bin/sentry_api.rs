//! Token Sentry Cloud API Server
//!
//! REST façade over the scan pipeline and the canonical risk registry.
//!
//! Usage:
//!   cargo run --bin sentry_api
//!
//! Environment:
//!   SENTRY_BIND_ADDR      - Listen address (default: 0.0.0.0:8080)
//!   SENTRY_CONTEXT_DIR    - Directory of <address>.json snapshots
//!   SENTRY_OWNER_ADDRESS  - Registry owner principal
//!   RUST_LOG              - Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use token_sentry::api::{create_router, handlers::AppState};
use token_sentry::{
    FileProvider, IdentityRegistryClient, NullIdentityRegistry, RegistryConfig, RiskAggregator,
    RiskPublisher, RiskRegistry, SentryConfig,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let config = SentryConfig::default();

    let provider = Arc::new(FileProvider::new(&config.context_dir));
    let registry = Arc::new(RiskRegistry::new(
        RegistryConfig::new(config.owner).with_staleness_secs(config.staleness_secs),
    ));
    if config.agent != config.owner {
        registry
            .authorize_agent(config.owner, config.agent)
            .map_err(|e| eyre::eyre!("{}", e))?;
    }

    let identity = Arc::new(NullIdentityRegistry);
    let agent_id = identity
        .register_agent(config.agent, "token-sentry", "")
        .await
        .map_err(|e| eyre::eyre!("{}", e))?;

    let publisher = Arc::new(
        RiskPublisher::new(
            RiskAggregator::new(provider),
            registry.clone(),
            config.agent,
        )
        .with_identity(identity, agent_id),
    );

    let state = Arc::new(AppState::new(
        publisher,
        registry,
        config.max_concurrent_scans,
    ));
    let state_for_shutdown = state.clone();
    let app = create_router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    info!("🚀 Token Sentry API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/scan             - Scan a token and publish the score");
    info!("  GET  /v1/token/:address   - Full risk record");
    info!("  GET  /v1/safe/:address    - Safety check against a threshold");
    info!("  GET  /v1/feed             - Registry event feed");
    info!("  GET  /v1/stats            - Pipeline statistics");
    info!("  GET  /v1/health           - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;
    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received");
    let snapshot = state_for_shutdown.stats.snapshot();
    info!("   Scans: {}", snapshot.scans_total);
    info!("   Published: {}", snapshot.publishes_ok);
    info!("   Critical reports: {}", snapshot.critical_reports);
    info!("🛑 Token Sentry API shutdown complete");

    Ok(())
}
