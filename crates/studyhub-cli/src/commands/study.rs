//! Live study session tracking.

use clap::Args;
use uuid::Uuid;

use studyhub_client::{StudySessionController, spawn_event_pump};
use studyhub_core::error::AppError;

use super::{Cli, build_context};

/// Arguments for the study command
#[derive(Debug, Args)]
pub struct StudyArgs {
    /// Subject to study
    #[arg(short, long)]
    pub subject: String,

    /// Group to share the session with
    #[arg(short, long)]
    pub group: Option<Uuid>,
}

/// Track a session live: start (or resume), show elapsed time, and end on
/// Ctrl+C.
pub async fn execute(args: &StudyArgs, cli: &Cli) -> Result<(), AppError> {
    let ctx = build_context(cli).await?;

    if let Some(group_id) = args.group {
        if !ctx.groups.is_member(group_id, cli.user).await? {
            return Err(AppError::validation(
                "You are not a member of that group. Join it first.",
            ));
        }
        // Presence is best-effort: solo tracking still works without the
        // relay.
        if ctx.transport.connect().await.is_err() {
            eprintln!("warning: presence relay unreachable, studying without live status");
        }
    }
    spawn_event_pump(&ctx.transport, ctx.presence.clone());

    let controller = StudySessionController::new(
        cli.user,
        ctx.sessions.clone(),
        ctx.profiles.clone(),
        ctx.progression.clone(),
        ctx.achievements.clone(),
        ctx.transport.clone(),
        ctx.tick_interval,
    );

    if let Some(group_id) = args.group {
        controller.join_group(group_id);
    }

    let session = match controller.resume().await? {
        Some(session) => {
            println!("Resuming session on '{}'", session.subject);
            session
        }
        None => {
            controller
                .start_session(&args.subject, args.group)
                .await?
        }
    };

    println!(
        "Studying '{}' — press Ctrl+C to finish",
        session.subject
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(std::time::Duration::from_secs(30)) => {
                if let Some(current) = controller.current_session() {
                    let studying = ctx.presence.studying_count();
                    if studying > 0 {
                        println!(
                            "{} min elapsed — {} group member(s) studying with you",
                            current.elapsed_minutes(chrono::Utc::now()),
                            studying
                        );
                    } else {
                        println!(
                            "{} min elapsed",
                            current.elapsed_minutes(chrono::Utc::now())
                        );
                    }
                }
            }
        }
    }

    match controller.end_session().await? {
        Some(finished) => println!(
            "Finished: {} minute(s) of '{}' credited",
            finished.duration_minutes, finished.subject
        ),
        None => println!("No session to finish"),
    }

    if let Some(group_id) = args.group {
        controller.leave_group(group_id);
    }
    ctx.transport.disconnect();
    Ok(())
}
