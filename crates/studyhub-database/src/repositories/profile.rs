//! Profile repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_entity::profile::{CreateProfile, Profile};

use crate::store::ProfileStore;

/// PostgreSQL-backed profile store.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Create a new profile store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find profile", e))
    }

    async fn create(&self, data: &CreateProfile) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, username, display_name) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(data.id)
        .bind(&data.username)
        .bind(&data.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("Username '{}' is taken", data.username))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create profile", e),
        })
    }

    async fn credit_study_time(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles \
             SET total_study_time = total_study_time + $2, \
                 experience_points = experience_points + $2, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(user_id)
        .bind(minutes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to credit study time", e))?
        .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))
    }

    async fn revoke_study_time(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles \
             SET total_study_time = GREATEST(total_study_time - $2, 0), \
                 experience_points = GREATEST(experience_points - $2, 0), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(user_id)
        .bind(minutes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke study time", e))?
        .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))
    }

    async fn grant_experience(&self, user_id: Uuid, amount: i32) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles \
             SET experience_points = experience_points + $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to grant experience", e))?
        .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))
    }

    async fn set_level(&self, user_id: Uuid, level: i32) -> AppResult<()> {
        sqlx::query("UPDATE profiles SET level = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(level)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set level", e))?;
        Ok(())
    }

    async fn update_streak(&self, user_id: Uuid) -> AppResult<i32> {
        let streak: i32 = sqlx::query_scalar("SELECT update_user_streak($1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update streak", e)
            })?;
        Ok(streak)
    }

    async fn leaderboard(&self, limit: i64) -> AppResult<Vec<Profile>> {
        sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles ORDER BY total_study_time DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load leaderboard", e))
    }
}
