//! collection-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and the
//! background broadcast poller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use collection_gateway::api;
use collection_gateway::app_state::AppState;
use collection_gateway::config::{GatewayConfig, StoreKind};
use collection_gateway::domain::EventBus;
use collection_gateway::persistence::{AuditLog, BlobStore};
use collection_gateway::service::{BroadcastPoller, CollectionGateway};
use collection_gateway::store::{DocumentStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, store = ?config.document_store, "starting collection-gateway");

    // Local persistence
    let blobs = Arc::new(BlobStore::from_config(&config));
    blobs
        .ensure_dirs()
        .await
        .context("creating data directories")?;
    let audit_log = Arc::new(AuditLog::in_folder(&config.save_folder));

    // Document store
    let store: Arc<dyn DocumentStore> = match config.document_store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Postgres => Arc::new(
            PostgresStore::connect(&config)
                .await
                .context("connecting to PostgreSQL")?,
        ),
    };

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let gateway = Arc::new(CollectionGateway::new(store, audit_log));
    let poller = BroadcastPoller::new(
        Arc::clone(&gateway),
        event_bus.clone(),
        Duration::from_secs(config.poll_interval_secs),
        config.poll_sample_size,
    )
    .spawn();

    // Build application state
    let app_state = AppState {
        gateway,
        blobs,
        event_bus,
    };
    let app = api::build_app(app_state, config.max_body_bytes);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
