//! Event pump: transport inbound stream → presence registry.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::presence::GroupPresence;
use crate::transport::TransportManager;

/// Spawn the task that feeds inbound relay events into the presence
/// registry. Returns `None` if the transport's event stream was already
/// taken.
pub fn spawn_event_pump(
    transport: &TransportManager,
    presence: Arc<GroupPresence>,
) -> Option<JoinHandle<()>> {
    let mut events = transport.take_events()?;
    Some(tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            presence.apply(&event);
        }
        debug!("Presence event pump ended");
    }))
}
