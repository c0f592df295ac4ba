//! Session status, manual entry, and history commands.

use clap::Args;
use uuid::Uuid;

use studyhub_core::error::AppError;

use super::{Cli, build_context};

/// Arguments for logging a completed block
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Subject studied
    #[arg(short, long)]
    pub subject: String,

    /// Minutes studied
    #[arg(short, long)]
    pub minutes: i32,

    /// Group to attribute the block to
    #[arg(short, long)]
    pub group: Option<Uuid>,
}

/// Arguments for session history
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Number of sessions to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: i64,
}

/// Show the active session, if any.
pub async fn status(cli: &Cli) -> Result<(), AppError> {
    let ctx = build_context(cli).await?;

    match ctx.sessions.find_active_by_user(cli.user).await? {
        Some(session) => println!(
            "Studying '{}' since {} ({} min elapsed)",
            session.subject,
            session.start_time.format("%H:%M"),
            session.elapsed_minutes(chrono::Utc::now())
        ),
        None => println!("Not studying"),
    }
    Ok(())
}

/// Log an already-completed study block.
pub async fn log(args: &LogArgs, cli: &Cli) -> Result<(), AppError> {
    let ctx = build_context(cli).await?;

    let session = ctx
        .manual_sessions
        .log_session(cli.user, &args.subject, args.minutes, None, args.group)
        .await?;

    println!(
        "Logged {} minute(s) of '{}'",
        session.duration_minutes, session.subject
    );
    Ok(())
}

/// Show recent sessions and profile totals.
pub async fn history(args: &HistoryArgs, cli: &Cli) -> Result<(), AppError> {
    let ctx = build_context(cli).await?;

    let profile = ctx
        .profiles
        .find_by_id(cli.user)
        .await?
        .ok_or_else(|| AppError::not_found("Profile not found"))?;

    println!(
        "{} — level {} ({}/{} XP, {:.0}%), {} min total, streak {}",
        profile.display_name,
        profile.level,
        profile.experience_points,
        profile.next_level_xp(),
        profile.level_progress() * 100.0,
        profile.total_study_time,
        profile.current_streak,
    );

    for session in ctx
        .sessions
        .find_recent_by_user(cli.user, args.limit)
        .await?
    {
        let marker = if session.is_active { "*" } else { " " };
        println!(
            "{} {}  {:>4} min  {}  [{}]",
            marker,
            session.start_time.format("%Y-%m-%d %H:%M"),
            session.duration_minutes,
            session.subject,
            session.session_type,
        );
    }
    Ok(())
}
