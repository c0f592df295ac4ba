//! Study session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_entity::session::{CreateStudySession, StudySession};

use crate::store::SessionStore;

/// PostgreSQL-backed study session store.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudySession>> {
        sqlx::query_as::<_, StudySession>("SELECT * FROM study_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Option<StudySession>> {
        sqlx::query_as::<_, StudySession>(
            "SELECT * FROM study_sessions WHERE user_id = $1 AND is_active \
             ORDER BY start_time DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active session", e)
        })
    }

    async fn find_recent_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<StudySession>> {
        sqlx::query_as::<_, StudySession>(
            "SELECT * FROM study_sessions WHERE user_id = $1 \
             ORDER BY start_time DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))
    }

    async fn count_finished_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM study_sessions WHERE user_id = $1 AND NOT is_active",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count sessions", e))?;
        Ok(count)
    }

    async fn create(&self, data: &CreateStudySession) -> AppResult<StudySession> {
        sqlx::query_as::<_, StudySession>(
            "INSERT INTO study_sessions \
             (user_id, group_id, subject, start_time, duration_minutes, is_active, session_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.group_id)
        .bind(&data.subject)
        .bind(data.start_time)
        .bind(data.duration_minutes)
        .bind(data.is_active)
        .bind(data.session_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn finish(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> AppResult<StudySession> {
        sqlx::query_as::<_, StudySession>(
            "UPDATE study_sessions \
             SET end_time = $2, duration_minutes = $3, is_active = false \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(end_time)
        .bind(duration_minutes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to finish session", e))?
        .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))
    }

    async fn update_duration(&self, id: Uuid, duration_minutes: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE study_sessions SET duration_minutes = $2 WHERE id = $1 AND is_active",
        )
        .bind(id)
        .bind(duration_minutes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update session duration", e)
        })?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM study_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete session", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
