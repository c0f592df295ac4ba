//! StudyHub Server — gamified study tracking with live group presence.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use studyhub_core::config::AppConfig;
use studyhub_core::error::AppError;
use studyhub_database::repositories::{
    PgAchievementStore, PgGroupStore, PgProfileStore, PgSessionStore,
};
use studyhub_realtime::RealtimeEngine;
use studyhub_service::{AchievementService, ManualSessionService, ProgressionService};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("STUDYHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting StudyHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = studyhub_database::connection::create_pool(&config.database).await?;
    studyhub_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Stores ───────────────────────────────────────────
    let profiles: Arc<dyn studyhub_database::ProfileStore> =
        Arc::new(PgProfileStore::new(db_pool.clone()));
    let sessions: Arc<dyn studyhub_database::SessionStore> =
        Arc::new(PgSessionStore::new(db_pool.clone()));
    let groups: Arc<dyn studyhub_database::GroupStore> =
        Arc::new(PgGroupStore::new(db_pool.clone()));
    let achievements_store: Arc<dyn studyhub_database::AchievementStore> =
        Arc::new(PgAchievementStore::new(db_pool.clone()));

    // ── Step 3: Services ─────────────────────────────────────────
    let progression = ProgressionService::new(profiles.clone());
    let achievements = AchievementService::new(
        achievements_store,
        profiles.clone(),
        sessions.clone(),
        progression.clone(),
    );
    let manual_sessions =
        ManualSessionService::new(sessions.clone(), progression, achievements.clone());
    tracing::info!("Services initialized");

    // ── Step 4: Realtime engine ──────────────────────────────────
    let engine = Arc::new(RealtimeEngine::new(config.realtime.clone()));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app_state = studyhub_api::state::AppState {
        config: Arc::new(config.clone()),
        profiles,
        sessions,
        groups,
        manual_sessions,
        achievements,
        engine: engine.clone(),
    };

    let app = studyhub_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("StudyHub server listening on {addr}");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("StudyHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
