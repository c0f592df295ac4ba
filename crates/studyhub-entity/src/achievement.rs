//! Achievement entity models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use studyhub_core::AppError;

/// What an achievement measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "requirement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// Total minutes studied.
    StudyTime,
    /// Number of finished sessions.
    Sessions,
    /// Consecutive study days.
    Streak,
}

impl RequirementType {
    /// Return the requirement type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudyTime => "study_time",
            Self::Sessions => "sessions",
            Self::Streak => "streak",
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequirementType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study_time" => Ok(Self::StudyTime),
            "sessions" => Ok(Self::Sessions),
            "streak" => Ok(Self::Streak),
            _ => Err(AppError::validation(format!(
                "Invalid requirement type: '{s}'. Expected one of: study_time, sessions, streak"
            ))),
        }
    }
}

/// An unlockable achievement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    /// Unique achievement identifier.
    pub id: Uuid,
    /// Achievement name.
    pub name: String,
    /// What the user did to earn it.
    pub description: String,
    /// Icon identifier for the presentation layer.
    pub icon: String,
    /// What this achievement measures.
    pub requirement_type: RequirementType,
    /// Threshold to earn the achievement.
    pub requirement_value: i32,
    /// XP granted on earning.
    pub experience_reward: i32,
}

/// A user's earned achievement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAchievement {
    /// The user.
    pub user_id: Uuid,
    /// The earned achievement.
    pub achievement_id: Uuid,
    /// When it was earned.
    pub earned_at: DateTime<Utc>,
}

/// An achievement joined with a user's progress toward it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementProgress {
    /// The achievement.
    #[serde(flatten)]
    pub achievement: Achievement,
    /// Current progress toward `requirement_value`.
    pub progress: i32,
    /// Whether the user has earned it.
    pub is_earned: bool,
    /// When it was earned, if earned.
    pub earned_at: Option<DateTime<Utc>>,
}
