//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// The bus subscription is taken before the upgrade completes, so the
/// client sees every event published after its handshake.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.event_bus.subscribe();
    let event_bus = state.event_bus.clone();

    ws.on_upgrade(move |socket| run_connection(socket, subscription, event_bus))
}
