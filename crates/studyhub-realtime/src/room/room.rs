//! Single room with subscriber tracking.

use std::collections::HashSet;

use crate::connection::handle::ConnectionId;

/// A single broadcast room with a set of subscribed connections.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room name.
    pub name: String,
    /// Set of subscribed connection IDs.
    pub subscribers: HashSet<ConnectionId>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new(name: String) -> Self {
        Self {
            name,
            subscribers: HashSet::new(),
        }
    }

    /// Adds a subscriber.
    pub fn subscribe(&mut self, conn_id: ConnectionId) {
        self.subscribers.insert(conn_id);
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&mut self, conn_id: ConnectionId) {
        self.subscribers.remove(&conn_id);
    }

    /// Returns subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns whether the room has any subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Returns all subscriber connection IDs.
    pub fn get_subscribers(&self) -> Vec<ConnectionId> {
        self.subscribers.iter().copied().collect()
    }
}
