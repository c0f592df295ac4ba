//! Inbound and outbound presence event type definitions.
//!
//! Events travel as JSON frames of the form `{"event": "...", "data": ...}`
//! with snake_case event names and camelCase payload keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent by the client to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Subscribe to a group's room.
    JoinGroup(Uuid),
    /// Unsubscribe from a group's room.
    LeaveGroup(Uuid),
    /// Announce the start of a study session to room peers.
    StartStudySession(StudyingPayload),
    /// Announce the end of a study session to room peers.
    EndStudySession(SessionSummary),
    /// Periodic elapsed-time tick for an active session.
    StudyTimerUpdate(TimerTick),
}

/// Events sent by the relay to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A room peer started studying.
    UserStartedStudying(StudyingPayload),
    /// A room peer stopped studying.
    UserStoppedStudying(StoppedStudying),
    /// A room peer's elapsed-time tick.
    StudyTimerUpdate(TimerTick),
}

/// Full presence payload announcing an active study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyingPayload {
    /// The studying user.
    pub user_id: Uuid,
    /// The group the session is shared with.
    pub group_id: Uuid,
    /// The user's handle.
    pub username: String,
    /// The user's display name.
    pub display_name: String,
    /// When the session started (ISO-8601 on the wire).
    pub start_time: DateTime<Utc>,
    /// Minutes elapsed so far (0 on start).
    pub elapsed_time: i64,
    /// Subject being studied.
    pub subject: String,
}

/// Client-side session summary sent when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// The user who studied.
    pub user_id: Uuid,
    /// The group the session was shared with.
    pub group_id: Uuid,
    /// Total minutes studied.
    pub total_time: i64,
    /// Subject studied.
    pub subject: String,
}

/// Relay-side notification that a peer stopped studying.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedStudying {
    /// The user who stopped.
    pub user_id: Uuid,
    /// The group the session was shared with.
    pub group_id: Uuid,
    /// Total minutes studied.
    pub total_time: i64,
}

/// Elapsed-time tick for an active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerTick {
    /// The studying user.
    pub user_id: Uuid,
    /// The group the session is shared with.
    pub group_id: Uuid,
    /// Minutes elapsed so far.
    pub elapsed_time: i64,
}
