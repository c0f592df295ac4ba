//! Achievement progress and awarding.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use studyhub_core::{AppError, AppResult};
use studyhub_database::{AchievementStore, ProfileStore, SessionStore};
use studyhub_entity::achievement::{Achievement, AchievementProgress, RequirementType};
use studyhub_entity::profile::Profile;

use crate::progression::ProgressionService;

/// Computes achievement progress and awards earned achievements.
#[derive(Clone)]
pub struct AchievementService {
    achievements: Arc<dyn AchievementStore>,
    profiles: Arc<dyn ProfileStore>,
    sessions: Arc<dyn SessionStore>,
    progression: ProgressionService,
}

impl AchievementService {
    /// Create a new achievement service.
    pub fn new(
        achievements: Arc<dyn AchievementStore>,
        profiles: Arc<dyn ProfileStore>,
        sessions: Arc<dyn SessionStore>,
        progression: ProgressionService,
    ) -> Self {
        Self {
            achievements,
            profiles,
            sessions,
            progression,
        }
    }

    /// Progress toward one achievement given the user's current totals.
    fn progress_value(
        achievement: &Achievement,
        profile: &Profile,
        finished_sessions: i64,
    ) -> i32 {
        match achievement.requirement_type {
            RequirementType::StudyTime => profile.total_study_time,
            RequirementType::Sessions => finished_sessions.min(i32::MAX as i64) as i32,
            RequirementType::Streak => profile.current_streak,
        }
    }

    /// The full catalog with the user's progress and earned flags.
    pub async fn progress_for(&self, user_id: Uuid) -> AppResult<Vec<AchievementProgress>> {
        let profile = self
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))?;
        let finished = self.sessions.count_finished_by_user(user_id).await?;
        let earned: HashMap<Uuid, _> = self
            .achievements
            .earned_by_user(user_id)
            .await?
            .into_iter()
            .map(|e| (e.achievement_id, e.earned_at))
            .collect();

        let catalog = self.achievements.list().await?;
        Ok(catalog
            .into_iter()
            .map(|achievement| {
                let progress = Self::progress_value(&achievement, &profile, finished)
                    .min(achievement.requirement_value);
                let earned_at = earned.get(&achievement.id).copied();
                AchievementProgress {
                    progress,
                    is_earned: earned_at.is_some(),
                    earned_at,
                    achievement,
                }
            })
            .collect())
    }

    /// Award every achievement whose threshold the user has now crossed.
    /// Returns the newly earned achievements.
    pub async fn check_and_award(&self, user_id: Uuid) -> AppResult<Vec<Achievement>> {
        let profile = self
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))?;
        let finished = self.sessions.count_finished_by_user(user_id).await?;

        let mut newly_earned = Vec::new();
        for achievement in self.achievements.list().await? {
            let progress = Self::progress_value(&achievement, &profile, finished);
            if progress < achievement.requirement_value {
                continue;
            }
            if self
                .achievements
                .award(user_id, achievement.id)
                .await?
                .is_some()
            {
                info!(
                    user_id = %user_id,
                    achievement = %achievement.name,
                    "Achievement earned"
                );
                if achievement.experience_reward > 0 {
                    self.profiles
                        .grant_experience(user_id, achievement.experience_reward)
                        .await?;
                }
                newly_earned.push(achievement);
            }
        }

        if !newly_earned.is_empty() {
            self.progression.sync_level(user_id).await?;
        }

        Ok(newly_earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhub_database::MemoryStore;
    use studyhub_entity::profile::CreateProfile;

    fn achievement(
        requirement_type: RequirementType,
        requirement_value: i32,
        reward: i32,
    ) -> Achievement {
        Achievement {
            id: Uuid::new_v4(),
            name: format!("{requirement_type}-{requirement_value}"),
            description: "test".to_string(),
            icon: "star".to_string(),
            requirement_type,
            requirement_value,
            experience_reward: reward,
        }
    }

    async fn setup() -> (Arc<MemoryStore>, AchievementService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        ProfileStore::create(
            store.as_ref(),
            &CreateProfile {
                id: user_id,
                username: "lia".to_string(),
                display_name: "Lia".to_string(),
            },
        )
        .await
        .unwrap();

        let progression = ProgressionService::new(store.clone());
        let service = AchievementService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            progression,
        );
        (store, service, user_id)
    }

    #[tokio::test]
    async fn test_award_on_crossed_threshold_only() {
        let (store, service, user_id) = setup().await;
        store.insert_achievement(achievement(RequirementType::StudyTime, 60, 10));
        store.insert_achievement(achievement(RequirementType::StudyTime, 600, 100));

        ProfileStore::credit_study_time(store.as_ref(), user_id, 90)
            .await
            .unwrap();

        let earned = service.check_and_award(user_id).await.unwrap();
        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].requirement_value, 60);

        // A second pass awards nothing new.
        assert!(service.check_and_award(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reward_grants_experience() {
        let (store, service, user_id) = setup().await;
        store.insert_achievement(achievement(RequirementType::StudyTime, 50, 25));

        ProfileStore::credit_study_time(store.as_ref(), user_id, 50)
            .await
            .unwrap();
        service.check_and_award(user_id).await.unwrap();

        let profile = ProfileStore::find_by_id(store.as_ref(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.experience_points, 75);
    }

    #[tokio::test]
    async fn test_progress_is_capped_at_requirement() {
        let (store, service, user_id) = setup().await;
        store.insert_achievement(achievement(RequirementType::StudyTime, 60, 0));

        ProfileStore::credit_study_time(store.as_ref(), user_id, 500)
            .await
            .unwrap();

        let progress = service.progress_for(user_id).await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].progress, 60);
        assert!(!progress[0].is_earned);
    }
}
