//! User profile entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's public profile and gamification totals.
///
/// The profile id equals the user id issued by the external identity
/// provider; authentication itself is not handled by this system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique handle.
    pub username: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Total minutes studied across all sessions.
    pub total_study_time: i32,
    /// Experience points (1 XP per study minute).
    pub experience_points: i32,
    /// Current level, derived from experience points.
    pub level: i32,
    /// Consecutive days with at least one finished session.
    pub current_streak: i32,
    /// Longest streak ever reached.
    pub longest_streak: i32,
    /// Last day a session was credited (drives streak math).
    pub last_study_date: Option<NaiveDate>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// XP needed to reach the next level.
    pub fn next_level_xp(&self) -> i32 {
        self.level * 100
    }

    /// Progress toward the next level as a fraction in `[0.0, 1.0]`.
    pub fn level_progress(&self) -> f64 {
        let needed = self.next_level_xp();
        if needed <= 0 {
            return 0.0;
        }
        (f64::from(self.experience_points) / f64::from(needed)).min(1.0)
    }
}

/// Data required to create a new profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    /// User id from the identity provider.
    pub id: Uuid,
    /// Desired handle.
    pub username: String,
    /// Display name.
    pub display_name: String,
}
