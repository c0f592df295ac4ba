//! Top-level real-time engine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use studyhub_core::config::realtime::RealtimeConfig;

use crate::relay::PresenceRelay;

/// Central real-time engine owning the presence relay.
///
/// Constructed once by the composition root and shared with the WebSocket
/// handler; also coordinates graceful shutdown.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// The presence relay.
    pub relay: Arc<PresenceRelay>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let relay = Arc::new(PresenceRelay::new(config));

        info!("Real-time engine initialized");

        Self { relay, shutdown_tx }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.relay.close_all();
    }
}
