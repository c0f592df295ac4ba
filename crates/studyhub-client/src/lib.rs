//! # studyhub-client
//!
//! The client core of StudyHub's presence subsystem: a reconnecting relay
//! transport, the in-memory "who is studying" registry, and the session
//! lifecycle controller bridging persisted sessions and presence
//! broadcasts.
//!
//! All three are plain dependency-injected objects owned by the
//! application's composition root; none of them is a global.

pub mod controller;
pub mod presence;
pub mod pump;
pub mod transport;

pub use controller::{SessionState, StudySessionController};
pub use presence::GroupPresence;
pub use pump::spawn_event_pump;
pub use studyhub_realtime::message::{ClientEvent, ServerEvent};
pub use transport::{ConnectionStatus, Dialer, RelayConnection, TransportManager, WsDialer};
