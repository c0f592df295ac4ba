//! Live "who is studying" registry.
//!
//! Consumes relay broadcasts into a queryable view of group members'
//! study status. State is ephemeral and derived purely from events; there
//! is no removal path for members who leave a group while studying —
//! their entries persist until overwritten or the container is dropped.

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use studyhub_entity::presence::MemberStatus;
use studyhub_realtime::message::ServerEvent;

/// In-memory registry of group members' live study status, keyed by user
/// id and scoped to the union of groups this client has joined.
#[derive(Debug)]
pub struct GroupPresence {
    members: DashMap<Uuid, MemberStatus>,
    changes_tx: broadcast::Sender<ServerEvent>,
}

impl GroupPresence {
    /// Create an empty presence registry.
    pub fn new() -> Self {
        let (changes_tx, _) = broadcast::channel(64);
        Self {
            members: DashMap::new(),
            changes_tx,
        }
    }

    /// Apply one inbound relay event.
    pub fn apply(&self, event: &ServerEvent) {
        let applied = match event {
            ServerEvent::UserStartedStudying(data) => {
                self.members
                    .entry(data.user_id)
                    .and_modify(|member| {
                        member.username = data.username.clone();
                        member.display_name = data.display_name.clone();
                        member.mark_started(data.start_time, data.subject.clone());
                    })
                    .or_insert_with(|| MemberStatus {
                        user_id: data.user_id,
                        username: data.username.clone(),
                        display_name: data.display_name.clone(),
                        is_studying: true,
                        study_start_time: Some(data.start_time),
                        elapsed_time: 0,
                        subject: Some(data.subject.clone()),
                    });
                true
            }
            ServerEvent::UserStoppedStudying(data) => {
                match self.members.get_mut(&data.user_id) {
                    Some(mut member) => {
                        member.mark_stopped();
                        true
                    }
                    // Unknown user: nothing to clear.
                    None => false,
                }
            }
            ServerEvent::StudyTimerUpdate(data) => {
                match self.members.get_mut(&data.user_id) {
                    Some(mut member) => {
                        member.elapsed_time = data.elapsed_time;
                        true
                    }
                    // Unknown user: ticks never create entries.
                    None => false,
                }
            }
        };

        if applied {
            let _ = self.changes_tx.send(event.clone());
        }
    }

    /// Snapshot of all known members.
    pub fn snapshot(&self) -> Vec<MemberStatus> {
        let mut members: Vec<MemberStatus> =
            self.members.iter().map(|m| m.value().clone()).collect();
        members.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        members
    }

    /// Look up one member's status.
    pub fn get(&self, user_id: Uuid) -> Option<MemberStatus> {
        self.members.get(&user_id).map(|m| m.value().clone())
    }

    /// Number of members currently studying.
    pub fn studying_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_studying).count()
    }

    /// Total number of known members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Subscribe to applied presence changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.changes_tx.subscribe()
    }
}

impl Default for GroupPresence {
    fn default() -> Self {
        Self::new()
    }
}
