//! Relay transport with bounded automatic reconnection.
//!
//! [`TransportManager`] owns at most one live connection to the presence
//! relay for the lifetime of the application instance. Dialing sits behind
//! the [`Dialer`] trait so tests can inject scripted transports.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use studyhub_core::config::client::ClientConfig;
use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_realtime::message::{ClientEvent, ServerEvent};

/// Observable connection state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection and no attempt in progress.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected to the relay.
    Connected,
    /// The automatic reconnect budget is spent; an explicit `connect()`
    /// is required to try again.
    ReconnectExhausted,
}

/// An established relay connection as a pair of frame channels.
///
/// The outbound sender feeds frames to the relay; the inbound receiver
/// yields frames from it and closes when the connection drops.
pub struct RelayConnection {
    /// Frames to the relay.
    pub outbound: mpsc::Sender<String>,
    /// Frames from the relay.
    pub inbound: mpsc::Receiver<String>,
}

/// Establishes relay connections.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dial the relay endpoint once.
    async fn dial(&self, url: &str, timeout: Duration) -> AppResult<RelayConnection>;
}

/// Production dialer over tokio-tungstenite.
#[derive(Debug, Default)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &str, timeout: Duration) -> AppResult<RelayConnection> {
        let (ws, _response) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| AppError::transport("Relay connection timed out"))?
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transport, "Failed to connect to relay", e)
            })?;

        let (mut ws_tx, mut ws_rx) = ws.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
        let (in_tx, in_rx) = mpsc::channel::<String>(64);

        // Outbound bridge: ends when the manager drops its sender.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_tx.close().await;
        });

        // Inbound bridge: ends when the socket closes.
        tokio::spawn(async move {
            while let Some(message) = ws_rx.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        });

        Ok(RelayConnection {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

/// The single relay connection shared by an application instance.
///
/// On connection errors the manager retries with a fixed delay up to a
/// fixed maximum of attempts; once the budget is spent it forces the
/// connection closed and stops, leaving recovery to an explicit
/// [`connect`](Self::connect). Emits while disconnected are silent
/// no-ops — transport failures are observable through
/// [`status`](Self::status), never thrown at emit callers.
pub struct TransportManager {
    dialer: Arc<dyn Dialer>,
    config: ClientConfig,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    events_tx: mpsc::Sender<ServerEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<ServerEvent>>>,
    status_tx: watch::Sender<ConnectionStatus>,
    reconnect_attempts: AtomicU32,
    closing: AtomicBool,
}

impl TransportManager {
    /// Create a manager using the production WebSocket dialer.
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Self::with_dialer(config, Arc::new(WsDialer))
    }

    /// Create a manager with an injected dialer.
    pub fn with_dialer(config: ClientConfig, dialer: Arc<dyn Dialer>) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Arc::new(Self {
            dialer,
            config,
            outbound: Mutex::new(None),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            status_tx,
            reconnect_attempts: AtomicU32::new(0),
            closing: AtomicBool::new(false),
        })
    }

    /// Establish the relay connection.
    ///
    /// Idempotent: returns immediately when already connected. Otherwise
    /// resets the attempt counter and dials with the bounded retry policy.
    pub async fn connect(self: &Arc<Self>) -> AppResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.closing.store(false, Ordering::SeqCst);
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        self.establish().await
    }

    /// Close the connection and clear the handle. Safe to call when not
    /// connected.
    pub fn disconnect(&self) {
        self.closing.store(true, Ordering::SeqCst);
        self.outbound.lock().unwrap().take();
        self.status_tx.send_replace(ConnectionStatus::Disconnected);
        info!("Relay transport disconnected");
    }

    /// Send a client event if connected; silent no-op otherwise.
    pub fn emit(&self, event: &ClientEvent) {
        let Some(tx) = self.outbound.lock().unwrap().clone() else {
            debug!("No relay connection, dropping emit");
            return;
        };
        match serde_json::to_string(event) {
            Ok(frame) => {
                if tx.try_send(frame).is_err() {
                    debug!("Relay emit dropped");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize client event"),
        }
    }

    /// Take the inbound event stream. Yields `None` after the first call.
    pub fn take_events(&self) -> Option<mpsc::Receiver<ServerEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Subscribe to connection status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// The current connection status.
    pub fn current_status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// Whether a live connection is held.
    pub fn is_connected(&self) -> bool {
        self.current_status() == ConnectionStatus::Connected
            && self.outbound.lock().unwrap().is_some()
    }

    /// Dial loop with the bounded retry policy.
    async fn establish(self: &Arc<Self>) -> AppResult<()> {
        self.status_tx.send_replace(ConnectionStatus::Connecting);
        let timeout = Duration::from_secs(self.config.connect_timeout_seconds);

        loop {
            match self.dialer.dial(&self.config.relay_url, timeout).await {
                Ok(connection) => {
                    self.reconnect_attempts.store(0, Ordering::SeqCst);
                    *self.outbound.lock().unwrap() = Some(connection.outbound);
                    self.status_tx.send_replace(ConnectionStatus::Connected);
                    info!(url = %self.config.relay_url, "Relay transport connected");
                    self.spawn_reader(connection.inbound);
                    return Ok(());
                }
                Err(e) => {
                    let errors = self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    warn!(
                        errors,
                        max_retries = self.config.max_reconnect_attempts,
                        error = %e,
                        "Relay connection error"
                    );
                    // The initial dial is free; the budget bounds the
                    // retries after it.
                    if errors > self.config.max_reconnect_attempts {
                        warn!("Max reconnection attempts reached");
                        self.outbound.lock().unwrap().take();
                        self.status_tx
                            .send_replace(ConnectionStatus::ReconnectExhausted);
                        return Err(AppError::transport(
                            "Relay reconnect budget exhausted",
                        ));
                    }
                    tokio::time::sleep(Duration::from_millis(self.config.reconnect_delay_ms))
                        .await;
                }
            }
        }
    }

    /// Forward inbound frames as parsed events; re-enter the retry loop if
    /// the connection drops without a deliberate disconnect.
    fn spawn_reader(self: &Arc<Self>, mut inbound: mpsc::Receiver<String>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                match serde_json::from_str::<ServerEvent>(&frame) {
                    Ok(event) => {
                        if manager.events_tx.try_send(event).is_err() {
                            debug!("Inbound event buffer full, dropping event");
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring unparseable relay frame"),
                }
            }

            if manager.closing.load(Ordering::SeqCst) {
                return;
            }

            warn!("Relay connection lost, attempting to reconnect");
            manager.outbound.lock().unwrap().take();
            manager
                .status_tx
                .send_replace(ConnectionStatus::Disconnected);
            let _ = manager.establish().await;
        });
    }
}
