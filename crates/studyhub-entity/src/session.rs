//! Study session entity model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use studyhub_core::AppError;

/// How a study session was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Tracked live by the timer, with presence broadcasts for group sessions.
    RealTime,
    /// Entered after the fact as an already-completed block.
    Manual,
}

impl SessionType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealTime => "real_time",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real_time" => Ok(Self::RealTime),
            "manual" => Ok(Self::Manual),
            _ => Err(AppError::validation(format!(
                "Invalid session type: '{s}'. Expected one of: real_time, manual"
            ))),
        }
    }
}

/// A contiguous block of study time.
///
/// Real-time sessions are created active and finished by the lifecycle
/// controller; manual sessions are created already inactive with a
/// caller-supplied duration. At most one active session should exist per
/// user at any time — enforced by a check before insert, not by a
/// database constraint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudySession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user who studied.
    pub user_id: Uuid,
    /// The group this session was shared with, if any.
    pub group_id: Option<Uuid>,
    /// Free-text subject being studied.
    pub subject: String,
    /// When the session started.
    pub start_time: DateTime<Utc>,
    /// When the session ended (unset while active).
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes studied; non-decreasing while active.
    pub duration_minutes: i32,
    /// Whether the session is still running.
    pub is_active: bool,
    /// How the session was recorded.
    pub session_type: SessionType,
}

impl StudySession {
    /// Whole minutes elapsed since the recorded start time (floor, clamped
    /// at zero against clock skew).
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_minutes().max(0)
    }

    /// Only finished manual entries may be deleted.
    pub fn is_deletable(&self) -> bool {
        self.session_type == SessionType::Manual && !self.is_active
    }
}

/// Data required to create a new study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudySession {
    /// The user who is studying.
    pub user_id: Uuid,
    /// The group to share the session with, if any.
    pub group_id: Option<Uuid>,
    /// Free-text subject.
    pub subject: String,
    /// When the session started.
    pub start_time: DateTime<Utc>,
    /// Initial duration (0 for real-time, the full block for manual).
    pub duration_minutes: i32,
    /// Whether the session starts active.
    pub is_active: bool,
    /// How the session is recorded.
    pub session_type: SessionType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(start: DateTime<Utc>) -> StudySession {
        StudySession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            group_id: None,
            subject: "calculus".to_string(),
            start_time: start,
            end_time: None,
            duration_minutes: 0,
            is_active: true,
            session_type: SessionType::RealTime,
        }
    }

    #[test]
    fn test_elapsed_minutes_floors() {
        let start = Utc::now();
        let s = session(start);
        assert_eq!(s.elapsed_minutes(start + Duration::seconds(59)), 0);
        assert_eq!(s.elapsed_minutes(start + Duration::seconds(119)), 1);
        assert_eq!(s.elapsed_minutes(start + Duration::seconds(125)), 2);
    }

    #[test]
    fn test_elapsed_minutes_clamps_negative() {
        let start = Utc::now();
        let s = session(start);
        assert_eq!(s.elapsed_minutes(start - Duration::seconds(30)), 0);
    }

    #[test]
    fn test_only_finished_manual_sessions_deletable() {
        let mut s = session(Utc::now());
        assert!(!s.is_deletable());

        s.session_type = SessionType::Manual;
        s.is_active = false;
        assert!(s.is_deletable());
    }
}
