//! Study group repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_entity::group::{CreateStudyGroup, GroupMember, GroupMemberProfile, StudyGroup};

use crate::store::GroupStore;

/// PostgreSQL-backed study group store.
#[derive(Debug, Clone)]
pub struct PgGroupStore {
    pool: PgPool,
}

impl PgGroupStore {
    /// Create a new group store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupStore for PgGroupStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudyGroup>> {
        sqlx::query_as::<_, StudyGroup>("SELECT * FROM study_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group", e))
    }

    async fn list(&self) -> AppResult<Vec<StudyGroup>> {
        sqlx::query_as::<_, StudyGroup>("SELECT * FROM study_groups ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list groups", e))
    }

    async fn create(&self, data: &CreateStudyGroup) -> AppResult<StudyGroup> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to start transaction", e)
        })?;

        let group = sqlx::query_as::<_, StudyGroup>(
            "INSERT INTO study_groups (name, description, subject, created_by) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.subject)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create group", e))?;

        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(group.id)
            .bind(data.created_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to add group creator", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit group creation", e)
        })?;

        Ok(group)
    }

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check membership", e))?;
        Ok(exists)
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<GroupMember> {
        sqlx::query_as::<_, GroupMember>(
            "INSERT INTO group_members (group_id, user_id) \
             VALUES ($1, $2) \
             RETURNING *",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Already a member of this group")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to add member", e),
        })
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
                .bind(group_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to remove member", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<GroupMemberProfile>> {
        sqlx::query_as::<_, GroupMemberProfile>(
            "SELECT p.id AS user_id, p.username, p.display_name, p.total_study_time, m.joined_at \
             FROM group_members m \
             JOIN profiles p ON p.id = m.user_id \
             WHERE m.group_id = $1 \
             ORDER BY m.joined_at",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list members", e))
    }
}
