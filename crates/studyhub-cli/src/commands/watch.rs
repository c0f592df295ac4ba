//! Live group presence watcher.

use clap::Args;
use uuid::Uuid;

use studyhub_client::{ClientEvent, spawn_event_pump};
use studyhub_core::error::AppError;

use super::{Cli, build_context};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Group whose presence to watch
    #[arg(short, long)]
    pub group: Uuid,
}

/// Subscribe to a group's room and print live study status.
pub async fn execute(args: &WatchArgs, cli: &Cli) -> Result<(), AppError> {
    let ctx = build_context(cli).await?;

    // Membership is confirmed against the store before subscribing; the
    // relay itself does not check it.
    if !ctx.groups.is_member(args.group, cli.user).await? {
        return Err(AppError::validation(
            "You are not a member of that group. Join it first.",
        ));
    }

    ctx.transport.connect().await?;
    let mut changes = ctx.presence.subscribe();
    spawn_event_pump(&ctx.transport, ctx.presence.clone());
    ctx.transport.emit(&ClientEvent::JoinGroup(args.group));

    println!("Watching group {} — press Ctrl+C to stop", args.group);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.recv() => {
                if changed.is_err() {
                    continue;
                }
                print_snapshot(&ctx.presence);
            }
        }
    }

    ctx.transport.emit(&ClientEvent::LeaveGroup(args.group));
    ctx.transport.disconnect();
    Ok(())
}

fn print_snapshot(presence: &studyhub_client::GroupPresence) {
    let members = presence.snapshot();
    println!("-- {} studying --", presence.studying_count());
    for member in members {
        if member.is_studying {
            println!(
                "  {} ({}) — {} — {} min",
                member.display_name,
                member.username,
                member.subject.as_deref().unwrap_or("studying"),
                member.elapsed_time
            );
        } else {
            println!("  {} ({}) — idle", member.display_name, member.username);
        }
    }
}
