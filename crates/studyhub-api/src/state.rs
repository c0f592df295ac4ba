//! Application state shared across all handlers.

use std::sync::Arc;

use studyhub_core::config::AppConfig;
use studyhub_database::{GroupStore, ProfileStore, SessionStore};
use studyhub_realtime::RealtimeEngine;
use studyhub_service::{AchievementService, ManualSessionService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,

    // ── Stores ───────────────────────────────────────────────
    /// Profile store.
    pub profiles: Arc<dyn ProfileStore>,
    /// Study session store.
    pub sessions: Arc<dyn SessionStore>,
    /// Study group store.
    pub groups: Arc<dyn GroupStore>,

    // ── Services ─────────────────────────────────────────────
    /// Manual session entry and deletion.
    pub manual_sessions: ManualSessionService,
    /// Achievement progress and awarding.
    pub achievements: AchievementService,

    // ── Realtime ─────────────────────────────────────────────
    /// Presence relay engine.
    pub engine: Arc<RealtimeEngine>,
}
