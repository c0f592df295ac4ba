//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /api/health — liveness plus relay occupancy.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "relay": {
            "connections": state.engine.relay.connection_count(),
            "rooms": state.engine.relay.room_count(),
        },
    }))
}
