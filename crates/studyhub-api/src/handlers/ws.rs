//! WebSocket endpoint hosting the presence relay.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::state::AppState;

/// GET /ws — upgrade onto the presence relay.
///
/// The relay performs no authentication of its own; see the relay crate
/// docs for the trust model.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_relay_connection(state, socket))
}

/// Pumps an upgraded socket through the relay.
async fn handle_relay_connection(state: AppState, socket: WebSocket) {
    let relay = state.engine.relay.clone();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = relay.register();
    let conn_id = handle.id;

    info!(conn_id = %conn_id, "Relay WebSocket established");

    // Outbound forwarder.
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => relay.handle_inbound(&conn_id, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Relay WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    relay.unregister(&conn_id);

    info!(conn_id = %conn_id, "Relay WebSocket closed");
}
