//! The presence relay — room membership and event rebroadcast.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use studyhub_core::config::realtime::RealtimeConfig;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::pool::ConnectionPool;
use crate::message::types::{ClientEvent, ServerEvent, StoppedStudying};
use crate::room::registry::RoomRegistry;
use crate::room::room_for_group;

/// Relays presence events between the members of each group room.
///
/// The relay trusts its clients: it performs no authentication and no
/// payload validation, and it keeps no state beyond room membership.
#[derive(Debug)]
pub struct PresenceRelay {
    /// Connection pool.
    pool: Arc<ConnectionPool>,
    /// Room registry.
    rooms: Arc<RoomRegistry>,
    /// Configuration.
    config: RealtimeConfig,
}

impl PresenceRelay {
    /// Creates a new relay.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            rooms: Arc::new(RoomRegistry::new()),
            config,
        }
    }

    /// Registers a new connection.
    ///
    /// Returns the connection handle and the receiver for outbound frames.
    pub fn register(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.connection_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.pool.add(handle.clone());

        info!(conn_id = %handle.id, "Relay connection registered");
        (handle, rx)
    }

    /// Unregisters a connection and removes it from all rooms.
    ///
    /// No "user went offline" event is broadcast to peers: a member who
    /// disconnects while studying stays marked as studying in peers' local
    /// state until the next stop or tick event.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            self.rooms.unsubscribe_all(*conn_id);
            info!(conn_id = %conn_id, "Relay connection unregistered");
        }
    }

    /// Processes an inbound frame from a client.
    pub fn handle_inbound(&self, conn_id: &ConnectionId, raw_frame: &str) {
        if self.pool.get(conn_id).is_none() {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        }

        let event: ClientEvent = match serde_json::from_str(raw_frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Ignoring unparseable frame");
                return;
            }
        };

        self.handle_event(conn_id, event);
    }

    /// Dispatches a parsed client event.
    fn handle_event(&self, conn_id: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::JoinGroup(group_id) => {
                if self.rooms.subscription_count(*conn_id)
                    >= self.config.max_rooms_per_connection
                {
                    warn!(
                        conn_id = %conn_id,
                        max = self.config.max_rooms_per_connection,
                        "Room subscription limit reached, ignoring join"
                    );
                    return;
                }
                self.rooms.subscribe(room_for_group(group_id), *conn_id);
                debug!(conn_id = %conn_id, group_id = %group_id, "Joined group room");
            }
            ClientEvent::LeaveGroup(group_id) => {
                self.rooms.unsubscribe(&room_for_group(group_id), *conn_id);
                debug!(conn_id = %conn_id, group_id = %group_id, "Left group room");
            }
            ClientEvent::StartStudySession(data) => {
                debug!(user_id = %data.user_id, group_id = %data.group_id, "Study session started");
                let room = room_for_group(data.group_id);
                self.broadcast_to_room(&room, &ServerEvent::UserStartedStudying(data), conn_id);
            }
            ClientEvent::EndStudySession(data) => {
                debug!(user_id = %data.user_id, group_id = %data.group_id, "Study session ended");
                let room = room_for_group(data.group_id);
                let stopped = StoppedStudying {
                    user_id: data.user_id,
                    group_id: data.group_id,
                    total_time: data.total_time,
                };
                self.broadcast_to_room(&room, &ServerEvent::UserStoppedStudying(stopped), conn_id);
            }
            ClientEvent::StudyTimerUpdate(data) => {
                let room = room_for_group(data.group_id);
                self.broadcast_to_room(&room, &ServerEvent::StudyTimerUpdate(data), conn_id);
            }
        }
    }

    /// Broadcasts an event to every room member except the sender.
    fn broadcast_to_room(&self, room_name: &str, event: &ServerEvent, sender: &ConnectionId) {
        let subscriber_ids = self.rooms.get_subscribers(room_name);
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to serialize broadcast event");
                return;
            }
        };

        for conn_id in subscriber_ids
            .iter()
            .filter(|conn_id| *conn_id != sender)
        {
            if let Some(handle) = self.pool.get(conn_id) {
                if !handle.send(frame.clone()) {
                    debug!(conn_id = %conn_id, room = %room_name, "Broadcast send failed");
                }
            }
        }
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Returns the subscriber count for a group's room.
    pub fn group_subscriber_count(&self, group_id: uuid::Uuid) -> usize {
        self.rooms.room_subscriber_count(&room_for_group(group_id))
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            conn.mark_dead();
            self.pool.remove(&conn.id);
            self.rooms.unsubscribe_all(conn.id);
        }
        info!(count = all.len(), "All relay connections closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::message::types::{SessionSummary, StudyingPayload, TimerTick};

    fn relay() -> PresenceRelay {
        PresenceRelay::new(RealtimeConfig::default())
    }

    fn studying(user_id: Uuid, group_id: Uuid, subject: &str) -> ClientEvent {
        ClientEvent::StartStudySession(StudyingPayload {
            user_id,
            group_id,
            username: "ana".to_string(),
            display_name: "Ana".to_string(),
            start_time: Utc::now(),
            elapsed_time: 0,
            subject: subject.to_string(),
        })
    }

    fn join(relay: &PresenceRelay, conn_id: &ConnectionId, group_id: Uuid) {
        relay.handle_inbound(
            conn_id,
            &serde_json::to_string(&ClientEvent::JoinGroup(group_id)).unwrap(),
        );
    }

    fn send(relay: &PresenceRelay, conn_id: &ConnectionId, event: &ClientEvent) {
        relay.handle_inbound(conn_id, &serde_json::to_string(event).unwrap());
    }

    #[tokio::test]
    async fn test_rebroadcast_excludes_sender() {
        let relay = relay();
        let (sender, mut sender_rx) = relay.register();
        let (peer, mut peer_rx) = relay.register();
        let group_id = Uuid::new_v4();

        join(&relay, &sender.id, group_id);
        join(&relay, &peer.id, group_id);

        let user_id = Uuid::new_v4();
        send(&relay, &sender.id, &studying(user_id, group_id, "biology"));

        let frame = peer_rx.try_recv().expect("peer should receive broadcast");
        let event: ServerEvent = serde_json::from_str(&frame).unwrap();
        match event {
            ServerEvent::UserStartedStudying(data) => {
                assert_eq!(data.user_id, user_id);
                assert_eq!(data.subject, "biology");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        assert!(sender_rx.try_recv().is_err(), "sender must not echo back");
    }

    #[tokio::test]
    async fn test_group_scoped_isolation() {
        let relay = relay();
        let (sender, _sender_rx) = relay.register();
        let (outsider, mut outsider_rx) = relay.register();
        let group_a = Uuid::new_v4();
        let group_b = Uuid::new_v4();

        join(&relay, &sender.id, group_a);
        join(&relay, &outsider.id, group_b);

        send(&relay, &sender.id, &studying(Uuid::new_v4(), group_a, "latin"));

        assert!(
            outsider_rx.try_recv().is_err(),
            "events for group A must not reach a client that only joined group B"
        );
    }

    #[tokio::test]
    async fn test_end_event_drops_subject_from_broadcast() {
        let relay = relay();
        let (sender, _sender_rx) = relay.register();
        let (peer, mut peer_rx) = relay.register();
        let group_id = Uuid::new_v4();

        join(&relay, &sender.id, group_id);
        join(&relay, &peer.id, group_id);

        let user_id = Uuid::new_v4();
        send(
            &relay,
            &sender.id,
            &ClientEvent::EndStudySession(SessionSummary {
                user_id,
                group_id,
                total_time: 42,
                subject: "history".to_string(),
            }),
        );

        let frame = peer_rx.try_recv().unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["event"], "user_stopped_studying");
        assert_eq!(json["data"]["totalTime"], 42);
        assert!(json["data"].get("subject").is_none());
    }

    #[tokio::test]
    async fn test_leave_group_stops_delivery() {
        let relay = relay();
        let (sender, _sender_rx) = relay.register();
        let (peer, mut peer_rx) = relay.register();
        let group_id = Uuid::new_v4();

        join(&relay, &sender.id, group_id);
        join(&relay, &peer.id, group_id);
        send(
            &relay,
            &peer.id,
            &ClientEvent::LeaveGroup(group_id),
        );

        send(
            &relay,
            &sender.id,
            &ClientEvent::StudyTimerUpdate(TimerTick {
                user_id: Uuid::new_v4(),
                group_id,
                elapsed_time: 3,
            }),
        );

        assert!(peer_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_cleans_rooms_without_broadcast() {
        let relay = relay();
        let (leaver, _leaver_rx) = relay.register();
        let (peer, mut peer_rx) = relay.register();
        let group_id = Uuid::new_v4();

        join(&relay, &leaver.id, group_id);
        join(&relay, &peer.id, group_id);
        assert_eq!(relay.group_subscriber_count(group_id), 2);

        relay.unregister(&leaver.id);

        assert_eq!(relay.group_subscriber_count(group_id), 1);
        assert_eq!(relay.connection_count(), 1);
        // No offline event reaches the peer.
        assert!(peer_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unparseable_frame_is_ignored() {
        let relay = relay();
        let (conn, _rx) = relay.register();
        relay.handle_inbound(&conn.id, "{not json");
        relay.handle_inbound(&conn.id, r#"{"event":"unknown_event","data":1}"#);
        assert_eq!(relay.connection_count(), 1);
    }
}
