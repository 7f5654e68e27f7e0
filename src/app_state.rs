//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::persistence::BlobStore;
use crate::service::CollectionGateway;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway for every document operation.
    pub gateway: Arc<CollectionGateway>,
    /// File-backed storage for snapshots, filters and display settings.
    pub blobs: Arc<BlobStore>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
