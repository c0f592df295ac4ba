//! Presence relay configuration.

use serde::{Deserialize, Serialize};

/// Presence relay (WebSocket room broadcast) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound message buffer size per connection.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer_size: usize,
    /// Maximum room subscriptions per connection.
    #[serde(default = "default_max_rooms")]
    pub max_rooms_per_connection: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connection_buffer_size: default_connection_buffer(),
            max_rooms_per_connection: default_max_rooms(),
        }
    }
}

fn default_connection_buffer() -> usize {
    256
}

fn default_max_rooms() -> usize {
    50
}
