//! In-memory presence entry for a group member.
//!
//! Presence is ephemeral by design: entries are derived purely from
//! broadcast events and are never persisted. A relay restart or client
//! reconnect loses them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Live study status of one group member, keyed by user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStatus {
    /// The member's user id.
    pub user_id: Uuid,
    /// Handle.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Whether the member is studying right now.
    pub is_studying: bool,
    /// When the current session started, if studying.
    pub study_start_time: Option<DateTime<Utc>>,
    /// Minutes elapsed in the current session; monotonic while studying.
    pub elapsed_time: i64,
    /// Subject being studied, if studying.
    pub subject: Option<String>,
}

impl MemberStatus {
    /// Transition into studying: overwrite the transient fields and reset
    /// the elapsed counter.
    pub fn mark_started(
        &mut self,
        start_time: DateTime<Utc>,
        subject: impl Into<String>,
    ) {
        self.is_studying = true;
        self.study_start_time = Some(start_time);
        self.subject = Some(subject.into());
        self.elapsed_time = 0;
    }

    /// Transition out of studying: clear the transient fields. The entry
    /// itself stays in the registry.
    pub fn mark_stopped(&mut self) {
        self.is_studying = false;
        self.study_start_time = None;
        self.subject = None;
        self.elapsed_time = 0;
    }
}
