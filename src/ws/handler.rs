//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade to a WebSocket streaming pool events.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    // Subscribed before the upgrade: events committed after this request are never missed.
    let event_rx = state.event_bus.subscribe();
    tracing::debug!(subscribers = state.event_bus.receiver_count(), "ws upgrade");

    ws.on_upgrade(move |socket| run_connection(socket, event_rx, state.pool_service))
}
