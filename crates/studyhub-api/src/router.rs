//! Route definitions for the StudyHub HTTP API.
//!
//! All REST routes are mounted under `/api`; the relay WebSocket lives at
//! `/ws` beside them.

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use tower_http::cors::{AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(profile_routes())
        .merge(session_routes())
        .merge(group_routes())
        .merge(achievement_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Profile and leaderboard endpoints.
fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", post(handlers::profile::create_profile))
        .route("/profiles/{id}", get(handlers::profile::get_profile))
        .route("/leaderboard", get(handlers::profile::leaderboard))
}

/// Study session endpoints.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/sessions/active", get(handlers::session::active_session))
        .route("/sessions/manual", post(handlers::session::create_manual))
        .route("/sessions/{id}", delete(handlers::session::delete_session))
}

/// Study group endpoints.
fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(handlers::group::list_groups))
        .route("/groups", post(handlers::group::create_group))
        .route("/groups/{id}/members", get(handlers::group::list_members))
        .route("/groups/{id}/members", post(handlers::group::join_group))
        .route("/groups/{id}/members", delete(handlers::group::leave_group))
        .route(
            "/groups/{id}/membership",
            get(handlers::group::check_membership),
        )
}

/// Achievement endpoints.
fn achievement_routes() -> Router<AppState> {
    Router::new().route("/achievements", get(handlers::achievement::list_achievements))
}

/// Health endpoints.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let cors_config = &state.config.server.cors;

    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|method| method.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(Any)
}
