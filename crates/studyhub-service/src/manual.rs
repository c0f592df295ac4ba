//! Manual session entry and deletion.
//!
//! Manual sessions are completed blocks entered after the fact: they are
//! created already inactive and credited immediately. Only manual sessions
//! may be deleted, and deletion reverses the credited totals.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use studyhub_core::{AppError, AppResult};
use studyhub_database::SessionStore;
use studyhub_entity::session::{CreateStudySession, SessionType, StudySession};

use crate::achievement::AchievementService;
use crate::progression::ProgressionService;

/// Creates and deletes manual study sessions.
#[derive(Clone)]
pub struct ManualSessionService {
    sessions: Arc<dyn SessionStore>,
    progression: ProgressionService,
    achievements: AchievementService,
}

impl ManualSessionService {
    /// Create a new manual session service.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        progression: ProgressionService,
        achievements: AchievementService,
    ) -> Self {
        Self {
            sessions,
            progression,
            achievements,
        }
    }

    /// Record an already-completed study block and credit it.
    pub async fn log_session(
        &self,
        user_id: Uuid,
        subject: &str,
        duration_minutes: i32,
        start_time: Option<DateTime<Utc>>,
        group_id: Option<Uuid>,
    ) -> AppResult<StudySession> {
        if subject.trim().is_empty() {
            return Err(AppError::validation("Subject must not be empty"));
        }
        if duration_minutes < 1 {
            return Err(AppError::validation(
                "Duration must be at least one minute",
            ));
        }

        let start_time =
            start_time.unwrap_or_else(|| Utc::now() - Duration::minutes(duration_minutes as i64));

        let session = self
            .sessions
            .create(&CreateStudySession {
                user_id,
                group_id,
                subject: subject.trim().to_string(),
                start_time,
                duration_minutes,
                is_active: false,
                session_type: SessionType::Manual,
            })
            .await?;
        // Manual rows are born finished; stamp the end time accordingly.
        let session = self
            .sessions
            .finish(
                session.id,
                start_time + Duration::minutes(duration_minutes as i64),
                duration_minutes,
            )
            .await?;

        self.progression.credit(user_id, duration_minutes).await?;
        self.achievements.check_and_award(user_id).await?;

        info!(
            user_id = %user_id,
            duration_minutes,
            "Manual session logged"
        );
        Ok(session)
    }

    /// Delete a manual session and reverse its credited totals. Streaks
    /// are not recomputed retroactively.
    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> AppResult<()> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;

        if !session.is_deletable() {
            return Err(AppError::validation(
                "Only completed manual sessions can be deleted",
            ));
        }

        self.sessions.delete(session_id).await?;
        self.progression
            .revoke(user_id, session.duration_minutes)
            .await?;

        info!(
            user_id = %user_id,
            session_id = %session_id,
            reversed_minutes = session.duration_minutes,
            "Manual session deleted"
        );
        Ok(())
    }
}
