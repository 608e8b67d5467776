//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{AssetPair, EventBus};
use crate::service::PoolService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Pool service for all business logic.
    pub pool_service: Arc<PoolService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Asset identities used to resolve request payloads.
    pub assets: Arc<AssetPair>,
}

impl AppState {
    /// Builds state around a service, sharing its event bus.
    #[must_use]
    pub fn new(pool_service: PoolService, assets: AssetPair) -> Self {
        let event_bus = pool_service.event_bus().clone();
        Self {
            pool_service: Arc::new(pool_service),
            event_bus,
            assets: Arc::new(assets),
        }
    }
}
