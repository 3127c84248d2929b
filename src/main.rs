//! zerokage-dex server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use zerokage_dex::app_state::AppState;
use zerokage_dex::build_app;
use zerokage_dex::config::DexConfig;
use zerokage_dex::domain::{EventBus, PoolEntry};
use zerokage_dex::ledger::InMemoryLedger;
use zerokage_dex::persistence::{PostgresPersistence, recorder};
use zerokage_dex::service::DexService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = DexConfig::from_env().context("loading configuration")?;
    tracing::info!(
        addr = %config.listen_addr,
        pool = %config.pool_address,
        token = %config.token_address,
        fee = %config.fee,
        "starting zerokage-dex"
    );

    // Build domain layer
    let ledger = Arc::new(InMemoryLedger::with_genesis(
        config.pool_address,
        config.genesis_account,
        config.genesis_token_supply,
        config.genesis_base_balance,
    ));
    let event_bus = EventBus::new(config.event_bus_capacity);
    let entry = PoolEntry::new(config.pool_address, config.token_address, config.fee);

    // Build service layer
    let dex = Arc::new(DexService::new(entry, ledger, event_bus.clone()));

    // Optional persistence
    if config.persistence_enabled {
        let persistence = PostgresPersistence::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        match recorder::restore_latest(&persistence, &dex).await {
            Ok(true) => {}
            Ok(false) => tracing::info!("no snapshot found, starting with an empty pool"),
            Err(e) => {
                tracing::error!(error = %e, "snapshot restore failed, starting with an empty pool");
            }
        }
        if config.event_log_enabled {
            recorder::spawn_event_log(persistence.clone(), event_bus.subscribe());
        }
        recorder::spawn_snapshotter(
            persistence,
            Arc::clone(&dex),
            Duration::from_secs(config.snapshot_interval_secs.max(1)),
            config.cleanup_after_days,
        );
        tracing::info!("persistence enabled");
    }

    // Build application state and router
    let app_state = AppState::new(dex);
    let app = build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
