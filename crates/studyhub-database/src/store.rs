//! Store trait seams.
//!
//! The controller, services, and API depend on these traits rather than on
//! a concrete backend, so tests can run against [`crate::MemoryStore`]
//! while production uses the PostgreSQL repositories. Every method is a
//! single request/response round trip; `credit_study_time`,
//! `revoke_study_time`, and `update_streak` are atomic server-side
//! operations invoked as one remote call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use studyhub_core::AppResult;
use studyhub_entity::achievement::{Achievement, UserAchievement};
use studyhub_entity::group::{CreateStudyGroup, GroupMember, GroupMemberProfile, StudyGroup};
use studyhub_entity::profile::{CreateProfile, Profile};
use studyhub_entity::session::{CreateStudySession, StudySession};

/// Study session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find a session by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudySession>>;

    /// Find a user's active session, if one exists.
    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Option<StudySession>>;

    /// List a user's sessions, newest first.
    async fn find_recent_by_user(&self, user_id: Uuid, limit: i64)
        -> AppResult<Vec<StudySession>>;

    /// Count a user's finished sessions.
    async fn count_finished_by_user(&self, user_id: Uuid) -> AppResult<i64>;

    /// Insert a new session row.
    async fn create(&self, data: &CreateStudySession) -> AppResult<StudySession>;

    /// Finish a session: set end time and final duration, clear the active
    /// flag.
    async fn finish(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> AppResult<StudySession>;

    /// Refresh the running duration of an active session.
    async fn update_duration(&self, id: Uuid, duration_minutes: i32) -> AppResult<()>;

    /// Delete a session row. Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Profile persistence and gamification totals.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Find a profile by user id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>>;

    /// Insert a new profile.
    async fn create(&self, data: &CreateProfile) -> AppResult<Profile>;

    /// Atomically add studied minutes to the user's cumulative study time
    /// and experience points. Returns the updated profile.
    async fn credit_study_time(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile>;

    /// Atomically subtract previously credited minutes (compensating
    /// reversal for deleted manual sessions). Totals never go below zero.
    async fn revoke_study_time(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile>;

    /// Atomically add bonus experience (achievement rewards). Returns the
    /// updated profile.
    async fn grant_experience(&self, user_id: Uuid, amount: i32) -> AppResult<Profile>;

    /// Persist a newly computed level.
    async fn set_level(&self, user_id: Uuid, level: i32) -> AppResult<()>;

    /// Recalculate the user's study streak server-side (same day keeps the
    /// streak, a consecutive day extends it, a gap resets it to 1).
    /// Returns the new streak length.
    async fn update_streak(&self, user_id: Uuid) -> AppResult<i32>;

    /// Top profiles by total study time, descending.
    async fn leaderboard(&self, limit: i64) -> AppResult<Vec<Profile>>;
}

/// Study group and membership persistence.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Find a group by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudyGroup>>;

    /// List all groups, newest first.
    async fn list(&self) -> AppResult<Vec<StudyGroup>>;

    /// Create a group; the creator becomes its first member.
    async fn create(&self, data: &CreateStudyGroup) -> AppResult<StudyGroup>;

    /// Check whether a user belongs to a group.
    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Add a member. Fails with a conflict if already a member.
    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<GroupMember>;

    /// Remove a member. Returns `true` if a membership was removed.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// List a group's members with profile fields.
    async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<GroupMemberProfile>>;
}

/// Achievement catalog and earned-achievement persistence.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    /// List the full achievement catalog.
    async fn list(&self) -> AppResult<Vec<Achievement>>;

    /// List the achievements a user has earned.
    async fn earned_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserAchievement>>;

    /// Record an earned achievement. Returns `None` if already earned.
    async fn award(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> AppResult<Option<UserAchievement>>;
}
