//! Achievement repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_entity::achievement::{Achievement, UserAchievement};

use crate::store::AchievementStore;

/// PostgreSQL-backed achievement store.
#[derive(Debug, Clone)]
pub struct PgAchievementStore {
    pool: PgPool,
}

impl PgAchievementStore {
    /// Create a new achievement store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AchievementStore for PgAchievementStore {
    async fn list(&self) -> AppResult<Vec<Achievement>> {
        sqlx::query_as::<_, Achievement>(
            "SELECT * FROM achievements ORDER BY requirement_type, requirement_value",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list achievements", e)
        })
    }

    async fn earned_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserAchievement>> {
        sqlx::query_as::<_, UserAchievement>(
            "SELECT * FROM user_achievements WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list earned achievements", e)
        })
    }

    async fn award(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> AppResult<Option<UserAchievement>> {
        sqlx::query_as::<_, UserAchievement>(
            "INSERT INTO user_achievements (user_id, achievement_id) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id, achievement_id) DO NOTHING \
             RETURNING *",
        )
        .bind(user_id)
        .bind(achievement_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to award achievement", e)
        })
    }
}
