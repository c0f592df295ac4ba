//! Study group and membership entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A study group whose members can see each other studying live.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudyGroup {
    /// Unique group identifier.
    pub id: Uuid,
    /// Group name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Main subject of the group.
    pub subject: String,
    /// User who created the group.
    pub created_by: Uuid,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new study group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudyGroup {
    /// Group name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Main subject.
    pub subject: String,
    /// Creating user (becomes the first member).
    pub created_by: Uuid,
}

/// A user's membership in a study group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    /// The group.
    pub group_id: Uuid,
    /// The member.
    pub user_id: Uuid,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

/// A group member joined with profile fields, for member listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMemberProfile {
    /// The member's user id.
    pub user_id: Uuid,
    /// Handle.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Total minutes studied.
    pub total_study_time: i32,
    /// When the user joined the group.
    pub joined_at: DateTime<Utc>,
}
