//! In-memory store implementation.
//!
//! Implements every store trait over concurrent maps. Used by the test
//! suite in place of PostgreSQL; behavior matches the repositories,
//! including the streak recalculation rules.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_entity::achievement::{Achievement, UserAchievement};
use studyhub_entity::group::{CreateStudyGroup, GroupMember, GroupMemberProfile, StudyGroup};
use studyhub_entity::profile::{CreateProfile, Profile};
use studyhub_entity::session::{CreateStudySession, StudySession};

use crate::store::{AchievementStore, GroupStore, ProfileStore, SessionStore};

/// In-memory store backing all four store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: DashMap<Uuid, StudySession>,
    profiles: DashMap<Uuid, Profile>,
    groups: DashMap<Uuid, StudyGroup>,
    members: DashMap<(Uuid, Uuid), GroupMember>,
    achievements: DashMap<Uuid, Achievement>,
    earned: DashMap<(Uuid, Uuid), UserAchievement>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an achievement in the catalog (tests and offline mode seed
    /// these by hand; the database seeds them via migration).
    pub fn insert_achievement(&self, achievement: Achievement) {
        self.achievements.insert(achievement.id, achievement);
    }

    /// Streak recalculation with an explicit "today", so tests can step
    /// through days deterministically.
    pub fn update_streak_on(&self, user_id: Uuid, today: NaiveDate) -> AppResult<i32> {
        let mut profile = self
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))?;

        let streak = match profile.last_study_date {
            Some(last) if last == today => profile.current_streak,
            Some(last) if last == today.pred_opt().unwrap_or(today) => {
                profile.current_streak + 1
            }
            _ => 1,
        };

        profile.current_streak = streak;
        profile.longest_streak = profile.longest_streak.max(streak);
        profile.last_study_date = Some(today);
        profile.updated_at = Utc::now();
        Ok(streak)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudySession>> {
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Option<StudySession>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .max_by_key(|s| s.start_time)
            .map(|s| s.value().clone()))
    }

    async fn find_recent_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<StudySession>> {
        let mut sessions: Vec<StudySession> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions)
    }

    async fn count_finished_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && !s.is_active)
            .count() as i64)
    }

    async fn create(&self, data: &CreateStudySession) -> AppResult<StudySession> {
        let session = StudySession {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            group_id: data.group_id,
            subject: data.subject.clone(),
            start_time: data.start_time,
            end_time: None,
            duration_minutes: data.duration_minutes,
            is_active: data.is_active,
            session_type: data.session_type,
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn finish(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> AppResult<StudySession> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))?;
        session.end_time = Some(end_time);
        session.duration_minutes = duration_minutes;
        session.is_active = false;
        Ok(session.clone())
    }

    async fn update_duration(&self, id: Uuid, duration_minutes: i32) -> AppResult<()> {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            if session.is_active {
                session.duration_minutes = duration_minutes;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.sessions.remove(&id).is_some())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|p| p.value().clone()))
    }

    async fn create(&self, data: &CreateProfile) -> AppResult<Profile> {
        if self.profiles.iter().any(|p| p.username == data.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' is taken",
                data.username
            )));
        }
        let now = Utc::now();
        let profile = Profile {
            id: data.id,
            username: data.username.clone(),
            display_name: data.display_name.clone(),
            total_study_time: 0,
            experience_points: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
            created_at: now,
            updated_at: now,
        };
        self.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn credit_study_time(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile> {
        let mut profile = self
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))?;
        profile.total_study_time += minutes;
        profile.experience_points += minutes;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn revoke_study_time(&self, user_id: Uuid, minutes: i32) -> AppResult<Profile> {
        let mut profile = self
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))?;
        profile.total_study_time = (profile.total_study_time - minutes).max(0);
        profile.experience_points = (profile.experience_points - minutes).max(0);
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn grant_experience(&self, user_id: Uuid, amount: i32) -> AppResult<Profile> {
        let mut profile = self
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))?;
        profile.experience_points += amount;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_level(&self, user_id: Uuid, level: i32) -> AppResult<()> {
        if let Some(mut profile) = self.profiles.get_mut(&user_id) {
            profile.level = level;
            profile.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_streak(&self, user_id: Uuid) -> AppResult<i32> {
        self.update_streak_on(user_id, Utc::now().date_naive())
    }

    async fn leaderboard(&self, limit: i64) -> AppResult<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self.profiles.iter().map(|p| p.value().clone()).collect();
        profiles.sort_by(|a, b| b.total_study_time.cmp(&a.total_study_time));
        profiles.truncate(limit.max(0) as usize);
        Ok(profiles)
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StudyGroup>> {
        Ok(self.groups.get(&id).map(|g| g.value().clone()))
    }

    async fn list(&self) -> AppResult<Vec<StudyGroup>> {
        let mut groups: Vec<StudyGroup> = self.groups.iter().map(|g| g.value().clone()).collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(groups)
    }

    async fn create(&self, data: &CreateStudyGroup) -> AppResult<StudyGroup> {
        let group = StudyGroup {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            description: data.description.clone(),
            subject: data.subject.clone(),
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        self.groups.insert(group.id, group.clone());
        self.members.insert(
            (group.id, data.created_by),
            GroupMember {
                group_id: group.id,
                user_id: data.created_by,
                joined_at: Utc::now(),
            },
        );
        Ok(group)
    }

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.members.contains_key(&(group_id, user_id)))
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<GroupMember> {
        if self.members.contains_key(&(group_id, user_id)) {
            return Err(AppError::conflict("Already a member of this group"));
        }
        let member = GroupMember {
            group_id,
            user_id,
            joined_at: Utc::now(),
        };
        self.members.insert((group_id, user_id), member.clone());
        Ok(member)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.members.remove(&(group_id, user_id)).is_some())
    }

    async fn list_members(&self, group_id: Uuid) -> AppResult<Vec<GroupMemberProfile>> {
        let mut members: Vec<GroupMemberProfile> = self
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .filter_map(|m| {
                self.profiles.get(&m.user_id).map(|p| GroupMemberProfile {
                    user_id: p.id,
                    username: p.username.clone(),
                    display_name: p.display_name.clone(),
                    total_study_time: p.total_study_time,
                    joined_at: m.joined_at,
                })
            })
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }
}

#[async_trait]
impl AchievementStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Achievement>> {
        let mut achievements: Vec<Achievement> =
            self.achievements.iter().map(|a| a.value().clone()).collect();
        achievements.sort_by(|a, b| {
            a.requirement_type
                .as_str()
                .cmp(b.requirement_type.as_str())
                .then(a.requirement_value.cmp(&b.requirement_value))
        });
        Ok(achievements)
    }

    async fn earned_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserAchievement>> {
        Ok(self
            .earned
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn award(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> AppResult<Option<UserAchievement>> {
        if self.earned.contains_key(&(user_id, achievement_id)) {
            return Ok(None);
        }
        let earned = UserAchievement {
            user_id,
            achievement_id,
            earned_at: Utc::now(),
        };
        self.earned.insert((user_id, achievement_id), earned.clone());
        Ok(Some(earned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use studyhub_entity::session::SessionType;

    async fn store_with_profile() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        ProfileStore::create(
            &store,
            &CreateProfile {
                id: user_id,
                username: "ana".to_string(),
                display_name: "Ana".to_string(),
            },
        )
        .await
        .unwrap();
        (store, user_id)
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (store, _) = store_with_profile().await;
        let err = ProfileStore::create(
            &store,
            &CreateProfile {
                id: Uuid::new_v4(),
                username: "ana".to_string(),
                display_name: "Other Ana".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, studyhub_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_credit_and_revoke_study_time() {
        let (store, user_id) = store_with_profile().await;

        let profile = store.credit_study_time(user_id, 45).await.unwrap();
        assert_eq!(profile.total_study_time, 45);
        assert_eq!(profile.experience_points, 45);

        let profile = store.revoke_study_time(user_id, 100).await.unwrap();
        assert_eq!(profile.total_study_time, 0);
        assert_eq!(profile.experience_points, 0);
    }

    #[tokio::test]
    async fn test_streak_rules() {
        let (store, user_id) = store_with_profile().await;
        let day1 = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        // First credited day starts a streak of 1.
        assert_eq!(store.update_streak_on(user_id, day1).unwrap(), 1);
        // Same day keeps it.
        assert_eq!(store.update_streak_on(user_id, day1).unwrap(), 1);
        // Consecutive day extends it.
        assert_eq!(
            store
                .update_streak_on(user_id, day1.succ_opt().unwrap())
                .unwrap(),
            2
        );
        // A gap resets to 1, but the longest streak is kept.
        let after_gap = day1 + Duration::days(5);
        assert_eq!(store.update_streak_on(user_id, after_gap).unwrap(), 1);
        let profile = ProfileStore::find_by_id(&store, user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.longest_streak, 2);
    }

    #[tokio::test]
    async fn test_active_session_lookup() {
        let (store, user_id) = store_with_profile().await;
        assert!(store.find_active_by_user(user_id).await.unwrap().is_none());

        let session = SessionStore::create(
            &store,
            &CreateStudySession {
                user_id,
                group_id: None,
                subject: "algebra".to_string(),
                start_time: Utc::now(),
                duration_minutes: 0,
                is_active: true,
                session_type: SessionType::RealTime,
            },
        )
        .await
        .unwrap();

        let active = store.find_active_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(active.id, session.id);

        store.finish(session.id, Utc::now(), 5).await.unwrap();
        assert!(store.find_active_by_user(user_id).await.unwrap().is_none());
        assert_eq!(store.count_finished_by_user(user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_award_is_idempotent() {
        let (store, user_id) = store_with_profile().await;
        let achievement_id = Uuid::new_v4();

        assert!(store.award(user_id, achievement_id).await.unwrap().is_some());
        assert!(store.award(user_id, achievement_id).await.unwrap().is_none());
        assert_eq!(store.earned_by_user(user_id).await.unwrap().len(), 1);
    }
}
