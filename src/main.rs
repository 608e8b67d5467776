//! amm-ledger server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use amm_ledger::api;
use amm_ledger::app_state::AppState;
use amm_ledger::config::{GatewayConfig, LogFormat};
use amm_ledger::domain::{Asset, EventBus, PoolEntry, PoolLedger};
use amm_ledger::persistence::{PersistenceHandle, PostgresPersistence, spawn_writer};
use amm_ledger::service::PoolService;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        asset_a = config.assets.identity(Asset::A),
        asset_b = config.assets.identity(Asset::B),
        fee_bps = config.fee.bps(),
        "starting amm-ledger"
    );

    let event_bus = EventBus::new(config.event_bus_capacity);

    let (pool_service, writer) = if config.persistence_enabled {
        let persistence = connect(&config).await?;
        let entry = restore_entry(&persistence, &config).await?;
        let (handle, receiver) = PersistenceHandle::channel();
        let writer = spawn_writer(persistence, receiver);
        (
            PoolService::new(entry, event_bus).with_persistence(handle),
            Some(writer),
        )
    } else {
        tracing::info!("persistence disabled; ledger state is in-memory only");
        let entry = PoolEntry::new(PoolLedger::new(config.fee), config.assets.clone());
        (PoolService::new(entry, event_bus), None)
    };

    let app_state = AppState::new(pool_service, config.assets.clone());
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The writer exits once the last handle is dropped. Upgraded WebSocket
    // tasks may still hold the service, so the drain is bounded.
    if let Some(writer) = writer {
        match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "persistence writer panicked"),
            Err(_) => tracing::warn!("persistence writer still busy at shutdown"),
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn connect(config: &GatewayConfig) -> anyhow::Result<PostgresPersistence> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    let persistence = PostgresPersistence::new(pool);
    persistence.migrate().await?;
    tracing::info!("database migrations applied");
    Ok(persistence)
}

/// Rebuilds the pool from the latest snapshot, or starts empty.
async fn restore_entry(
    persistence: &PostgresPersistence,
    config: &GatewayConfig,
) -> anyhow::Result<PoolEntry> {
    let Some(stored) = persistence.load_latest_snapshot().await? else {
        tracing::info!("no snapshot found; starting with an empty pool");
        return Ok(PoolEntry::new(
            PoolLedger::new(config.fee),
            config.assets.clone(),
        ));
    };

    if stored.state.assets != config.assets {
        tracing::warn!("configured asset identities differ from the snapshot; using the snapshot");
    }
    if stored.state.ledger.fee_bps != config.fee.bps() {
        tracing::warn!(
            configured = config.fee.bps(),
            stored = stored.state.ledger.fee_bps,
            "configured fee differs from the snapshot; using the snapshot"
        );
    }

    let records = persistence.load_swap_records().await?;
    let swap_count = records.len();
    let entry = stored
        .state
        .restore(records)
        .context("persisted ledger state is invalid")?;
    tracing::info!(
        snapshot_id = stored.id,
        snapshot_at = %stored.snapshot_at,
        swap_count,
        "ledger restored"
    );
    Ok(entry)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
