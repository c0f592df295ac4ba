//! Subscription tracking — which connections are in which rooms.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

/// Tracks connection-to-room subscription mappings (reverse index).
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → set of room names.
    conn_to_rooms: DashMap<ConnectionId, HashSet<String>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription.
    pub fn add(&self, conn_id: ConnectionId, room: String) {
        self.conn_to_rooms.entry(conn_id).or_default().insert(room);
    }

    /// Removes a subscription.
    pub fn remove(&self, conn_id: ConnectionId, room: &str) {
        if let Some(mut rooms) = self.conn_to_rooms.get_mut(&conn_id) {
            rooms.remove(room);
        }
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_rooms
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a connection and returns them.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.conn_to_rooms
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default()
    }
}
