//! Room registry — manages all rooms and subscriptions.

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::room::Room;
use super::subscription::SubscriptionTracker;

/// Registry of all active rooms.
///
/// Rooms are created on first subscribe and dropped when their last
/// subscriber leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name → Room.
    rooms: DashMap<String, Room>,
    /// Subscription tracker (reverse index).
    subscriptions: SubscriptionTracker,
}

impl RoomRegistry {
    /// Creates a new room registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a connection to a room.
    pub fn subscribe(&self, room_name: String, conn_id: ConnectionId) {
        self.rooms
            .entry(room_name.clone())
            .or_insert_with(|| Room::new(room_name.clone()))
            .subscribe(conn_id);

        self.subscriptions.add(conn_id, room_name);
    }

    /// Unsubscribes a connection from a room.
    pub fn unsubscribe(&self, room_name: &str, conn_id: ConnectionId) {
        if let Some(mut room) = self.rooms.get_mut(room_name) {
            room.unsubscribe(conn_id);
            if room.is_empty() {
                drop(room);
                self.rooms.remove(room_name);
            }
        }
        self.subscriptions.remove(conn_id, room_name);
    }

    /// Unsubscribes a connection from all rooms.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) {
        let rooms = self.subscriptions.remove_all(conn_id);
        for room_name in &rooms {
            if let Some(mut room) = self.rooms.get_mut(room_name) {
                room.unsubscribe(conn_id);
                if room.is_empty() {
                    drop(room);
                    self.rooms.remove(room_name);
                }
            }
        }
    }

    /// Returns all subscriber connection IDs for a room.
    pub fn get_subscribers(&self, room_name: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room_name)
            .map(|room| room.get_subscribers())
            .unwrap_or_default()
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns subscriber count for a room.
    pub fn room_subscriber_count(&self, room_name: &str) -> usize {
        self.rooms
            .get(room_name)
            .map(|room| room.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns total number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
