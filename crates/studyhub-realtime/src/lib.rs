//! # studyhub-realtime
//!
//! The presence relay for StudyHub. Groups WebSocket connections into
//! rooms (one per study group) and rebroadcasts study-status events to
//! room peers, excluding the sender. The relay holds no business state
//! beyond room membership and performs no authentication or payload
//! validation of its own — membership is enforced by clients only joining
//! rooms after confirming membership against the store.

pub mod connection;
pub mod engine;
pub mod message;
pub mod relay;
pub mod room;

pub use engine::RealtimeEngine;
pub use relay::PresenceRelay;
