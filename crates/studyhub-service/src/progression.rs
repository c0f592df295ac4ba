//! Study-time crediting and level math.
//!
//! The XP system is deliberately simple: every credited study minute is
//! worth 1 XP, and each level takes 100 XP.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use studyhub_core::AppResult;
use studyhub_database::ProfileStore;
use studyhub_entity::profile::Profile;

/// Level implied by an experience total.
pub fn level_for_xp(experience_points: i32) -> i32 {
    experience_points.max(0) / 100 + 1
}

/// Credits and reverses study time against a user's profile, keeping the
/// derived level in sync and triggering the streak recalculation.
#[derive(Clone)]
pub struct ProgressionService {
    profiles: Arc<dyn ProfileStore>,
}

impl ProgressionService {
    /// Create a new progression service.
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Credit finished study minutes: bump totals, recompute the level,
    /// and recalculate the streak. Returns the updated profile.
    pub async fn credit(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile> {
        let mut profile = self.profiles.credit_study_time(user_id, minutes).await?;

        let level = level_for_xp(profile.experience_points);
        if level != profile.level {
            info!(user_id = %user_id, from = profile.level, to = level, "Level changed");
            self.profiles.set_level(user_id, level).await?;
            profile.level = level;
        }

        profile.current_streak = self.profiles.update_streak(user_id).await?;
        Ok(profile)
    }

    /// Reverse a previous credit (deleted manual session). The streak is
    /// not recomputed retroactively.
    pub async fn revoke(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile> {
        let mut profile = self.profiles.revoke_study_time(user_id, minutes).await?;

        let level = level_for_xp(profile.experience_points);
        if level != profile.level {
            self.profiles.set_level(user_id, level).await?;
            profile.level = level;
        }

        Ok(profile)
    }

    /// Re-derive the level after out-of-band XP changes (achievement
    /// rewards).
    pub async fn sync_level(&self, user_id: Uuid) -> AppResult<()> {
        if let Some(profile) = self.profiles.find_by_id(user_id).await? {
            let level = level_for_xp(profile.experience_points);
            if level != profile.level {
                self.profiles.set_level(user_id, level).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhub_database::MemoryStore;
    use studyhub_entity::profile::CreateProfile;

    #[test]
    fn test_level_for_xp_thresholds() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);
        assert_eq!(level_for_xp(-5), 1);
    }

    #[tokio::test]
    async fn test_credit_updates_totals_level_and_streak() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        store
            .create(&CreateProfile {
                id: user_id,
                username: "rui".to_string(),
                display_name: "Rui".to_string(),
            })
            .await
            .unwrap();

        let service = ProgressionService::new(store.clone());
        let profile = service.credit(user_id, 120).await.unwrap();

        assert_eq!(profile.total_study_time, 120);
        assert_eq!(profile.experience_points, 120);
        assert_eq!(profile.level, 2);
        assert_eq!(profile.current_streak, 1);

        let stored = store.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(stored.level, 2);
    }

    #[tokio::test]
    async fn test_revoke_restores_level() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        store
            .create(&CreateProfile {
                id: user_id,
                username: "rui".to_string(),
                display_name: "Rui".to_string(),
            })
            .await
            .unwrap();

        let service = ProgressionService::new(store.clone());
        service.credit(user_id, 150).await.unwrap();
        let profile = service.revoke(user_id, 100).await.unwrap();

        assert_eq!(profile.total_study_time, 50);
        assert_eq!(profile.level, 1);
    }
}
