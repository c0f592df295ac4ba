//! Session lifecycle controller.
//!
//! The single source of truth for "is the current user studying". Bridges
//! the persisted session record (via the store traits) and the transient
//! presence broadcasts (via the transport manager). The persisted write
//! and the group emit are deliberately independent: a store failure after
//! a successful emit, or vice versa, leaves the two views inconsistent
//! and is not retried or reconciled.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use studyhub_core::{AppError, AppResult};
use studyhub_database::{ProfileStore, SessionStore};
use studyhub_entity::session::{CreateStudySession, SessionType, StudySession};
use studyhub_realtime::message::{ClientEvent, SessionSummary, StudyingPayload, TimerTick};
use studyhub_service::{AchievementService, ProgressionService};

use crate::transport::TransportManager;

/// Lifecycle state of the current user's study session.
///
/// `Starting` and `Ending` are request-in-flight sub-states; a failure
/// returns to the prior stable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not studying.
    Idle,
    /// Start request in flight.
    Starting,
    /// Studying.
    Active,
    /// End request in flight.
    Ending,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    current: Option<StudySession>,
    tick_task: Option<JoinHandle<()>>,
}

/// Orchestrates starting and ending study sessions for one user.
///
/// The duplicate-session check is a read immediately before the insert,
/// not an atomic operation: two rapid start calls (e.g. two tabs) can
/// both pass it. This is a known limitation, kept rather than fixed with
/// a server-side constraint.
pub struct StudySessionController {
    user_id: Uuid,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    progression: ProgressionService,
    achievements: AchievementService,
    transport: Arc<TransportManager>,
    inner: Mutex<Inner>,
    tick_interval: Duration,
}

impl StudySessionController {
    /// Create a controller for the authenticated user.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        progression: ProgressionService,
        achievements: AchievementService,
        transport: Arc<TransportManager>,
        tick_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            user_id,
            sessions,
            profiles,
            progression,
            achievements,
            transport,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                current: None,
                tick_task: None,
            }),
            tick_interval,
        })
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// The locally held session, if any.
    pub fn current_session(&self) -> Option<StudySession> {
        self.inner.lock().unwrap().current.clone()
    }

    /// Whether the user is studying right now.
    pub fn is_studying(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Start a real-time study session.
    ///
    /// Fails with a conflict if an active session already exists. On
    /// success the controller is `Active`, and — only when a group is
    /// given — the start is broadcast to the group's room.
    pub async fn start_session(
        self: &Arc<Self>,
        subject: &str,
        group_id: Option<Uuid>,
    ) -> AppResult<StudySession> {
        if subject.trim().is_empty() {
            return Err(AppError::validation("Subject must not be empty"));
        }

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.state != SessionState::Idle {
                return Err(AppError::conflict(
                    "You already have an active study session. Finish it before starting a new one.",
                ));
            }
            inner.state = SessionState::Starting;
        }

        match self.persist_start(subject.trim(), group_id).await {
            Ok((session, username, display_name)) => {
                {
                    let mut inner = self.inner.lock().unwrap();
                    inner.state = SessionState::Active;
                    inner.current = Some(session.clone());
                    inner.tick_task = Some(self.spawn_tick());
                }

                if let Some(group_id) = group_id {
                    self.transport
                        .emit(&ClientEvent::StartStudySession(StudyingPayload {
                            user_id: self.user_id,
                            group_id,
                            username,
                            display_name,
                            start_time: session.start_time,
                            elapsed_time: 0,
                            subject: session.subject.clone(),
                        }));
                }

                info!(
                    user_id = %self.user_id,
                    session_id = %session.id,
                    "Study session started"
                );
                Ok(session)
            }
            Err(e) => {
                self.inner.lock().unwrap().state = SessionState::Idle;
                Err(e)
            }
        }
    }

    /// The awaited store steps of a start: duplicate check, profile read,
    /// insert. Check-then-insert is sequential and not atomic.
    async fn persist_start(
        &self,
        subject: &str,
        group_id: Option<Uuid>,
    ) -> AppResult<(StudySession, String, String)> {
        if self
            .sessions
            .find_active_by_user(self.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "You already have an active study session. Finish it before starting a new one.",
            ));
        }

        let profile = self
            .profiles
            .find_by_id(self.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {} not found", self.user_id)))?;

        let session = self
            .sessions
            .create(&CreateStudySession {
                user_id: self.user_id,
                group_id,
                subject: subject.to_string(),
                start_time: Utc::now(),
                duration_minutes: 0,
                is_active: true,
                session_type: SessionType::RealTime,
            })
            .await?;

        Ok((session, profile.username, profile.display_name))
    }

    /// End the current session.
    ///
    /// No-op when there is nothing to end. The final duration is the
    /// floor of whole minutes since the recorded start. After the session
    /// row is finished, the credit, streak, and achievement effects are
    /// applied without rollback on partial failure, and the group emit is
    /// fire-and-forget.
    pub async fn end_session(self: &Arc<Self>) -> AppResult<Option<StudySession>> {
        let session = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state != SessionState::Active {
                return Ok(None);
            }
            let Some(session) = inner.current.clone() else {
                return Ok(None);
            };
            inner.state = SessionState::Ending;
            session
        };

        let now = Utc::now();
        let duration = session.elapsed_minutes(now) as i32;

        let finished = match self.sessions.finish(session.id, now, duration).await {
            Ok(finished) => finished,
            Err(e) => {
                // The record is untouched; return to the prior stable state.
                self.inner.lock().unwrap().state = SessionState::Active;
                return Err(e);
            }
        };

        self.clear_current();

        self.progression.credit(self.user_id, duration).await?;
        self.achievements.check_and_award(self.user_id).await?;

        if let Some(group_id) = finished.group_id {
            self.transport
                .emit(&ClientEvent::EndStudySession(SessionSummary {
                    user_id: self.user_id,
                    group_id,
                    total_time: duration as i64,
                    subject: finished.subject.clone(),
                }));
        }

        info!(
            user_id = %self.user_id,
            session_id = %finished.id,
            duration_minutes = duration,
            "Study session ended"
        );
        Ok(Some(finished))
    }

    /// Resume an active session found in the store (application start).
    ///
    /// No start broadcast is re-emitted: peers who were not already
    /// subscribed learn of the session at the next tick.
    pub async fn resume(self: &Arc<Self>) -> AppResult<Option<StudySession>> {
        let Some(session) = self.sessions.find_active_by_user(self.user_id).await? else {
            return Ok(None);
        };

        let mut inner = self.inner.lock().unwrap();
        if inner.state != SessionState::Idle {
            return Ok(inner.current.clone());
        }
        inner.state = SessionState::Active;
        inner.current = Some(session.clone());
        inner.tick_task = Some(self.spawn_tick());

        info!(
            user_id = %self.user_id,
            session_id = %session.id,
            "Resumed active study session"
        );
        Ok(Some(session))
    }

    /// Subscribe to a group's room. Silent no-op without a connection;
    /// callers confirm membership against the store before subscribing.
    pub fn join_group(&self, group_id: Uuid) {
        self.transport.emit(&ClientEvent::JoinGroup(group_id));
    }

    /// Unsubscribe from a group's room. Silent no-op without a connection.
    pub fn leave_group(&self, group_id: Uuid) {
        self.transport.emit(&ClientEvent::LeaveGroup(group_id));
    }

    /// Abort the tick task and return to `Idle`.
    fn clear_current(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.tick_task.take() {
            task.abort();
        }
        inner.state = SessionState::Idle;
        inner.current = None;
    }

    /// Periodic tick while a session is active: recompute elapsed minutes
    /// from the wall clock (not an incrementing counter), refresh the
    /// held record, and broadcast the tick when the session has a group.
    fn spawn_tick(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(controller.tick_interval);
            // The first tick fires immediately; skip it.
            interval.tick().await;
            loop {
                interval.tick().await;

                let session = {
                    let inner = controller.inner.lock().unwrap();
                    if inner.state != SessionState::Active {
                        break;
                    }
                    match inner.current.clone() {
                        Some(session) => session,
                        None => break,
                    }
                };

                let elapsed = session.elapsed_minutes(Utc::now());
                {
                    let mut inner = controller.inner.lock().unwrap();
                    if let Some(current) = inner.current.as_mut() {
                        current.duration_minutes = elapsed as i32;
                    }
                }

                if let Err(e) = controller
                    .sessions
                    .update_duration(session.id, elapsed as i32)
                    .await
                {
                    warn!(error = %e, "Failed to persist session duration");
                }

                if let Some(group_id) = session.group_id {
                    controller
                        .transport
                        .emit(&ClientEvent::StudyTimerUpdate(TimerTick {
                            user_id: controller.user_id,
                            group_id,
                            elapsed_time: elapsed,
                        }));
                }
            }
        })
    }
}
