//! CLI command definitions and dispatch.

pub mod sessions;
pub mod study;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use studyhub_client::{GroupPresence, TransportManager};
use studyhub_core::config::AppConfig;
use studyhub_core::error::AppError;
use studyhub_database::repositories::{
    PgAchievementStore, PgGroupStore, PgProfileStore, PgSessionStore,
};
use studyhub_database::{AchievementStore, GroupStore, ProfileStore, SessionStore};
use studyhub_service::{AchievementService, ManualSessionService, ProgressionService};

/// StudyHub — study tracking with live group presence
#[derive(Debug, Parser)]
#[command(name = "studyhub", version, about, long_about = None)]
pub struct Cli {
    /// Environment whose configuration to load (config/<env>.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Acting user id (issued by the identity provider)
    #[arg(short, long)]
    pub user: Uuid,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track a study session live until interrupted
    Study(study::StudyArgs),
    /// Watch a group's live study presence
    Watch(watch::WatchArgs),
    /// Show the active session, if any
    Status,
    /// Log an already-completed study block
    Log(sessions::LogArgs),
    /// Show recent sessions and profile totals
    History(sessions::HistoryArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Study(args) => study::execute(args, self).await,
            Commands::Watch(args) => watch::execute(args, self).await,
            Commands::Status => sessions::status(self).await,
            Commands::Log(args) => sessions::log(args, self).await,
            Commands::History(args) => sessions::history(args, self).await,
        }
    }
}

/// Everything a command needs: stores, services, and the presence client.
pub struct ClientContext {
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub groups: Arc<dyn GroupStore>,
    pub achievements: AchievementService,
    pub manual_sessions: ManualSessionService,
    pub progression: ProgressionService,
    pub transport: Arc<TransportManager>,
    pub presence: Arc<GroupPresence>,
    pub tick_interval: Duration,
}

/// Build the client context from configuration.
pub async fn build_context(cli: &Cli) -> Result<ClientContext, AppError> {
    let config = AppConfig::load(&cli.env)?;

    let db_pool = studyhub_database::connection::create_pool(&config.database).await?;

    let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(db_pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db_pool.clone()));
    let groups: Arc<dyn GroupStore> = Arc::new(PgGroupStore::new(db_pool.clone()));
    let achievements_store: Arc<dyn AchievementStore> =
        Arc::new(PgAchievementStore::new(db_pool));

    let progression = ProgressionService::new(profiles.clone());
    let achievements = AchievementService::new(
        achievements_store,
        profiles.clone(),
        sessions.clone(),
        progression.clone(),
    );
    let manual_sessions = ManualSessionService::new(
        sessions.clone(),
        progression.clone(),
        achievements.clone(),
    );

    let transport = TransportManager::new(config.client.clone());
    let presence = Arc::new(GroupPresence::new());
    let tick_interval = Duration::from_secs(config.client.tick_interval_seconds);

    Ok(ClientContext {
        profiles,
        sessions,
        groups,
        achievements,
        manual_sessions,
        progression,
        transport,
        presence,
        tick_interval,
    })
}
