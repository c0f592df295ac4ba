//! Presence client transport configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the client side of the presence transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the presence relay.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Maximum automatic reconnection attempts before giving up.
    #[serde(default = "default_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Delay between reconnection attempts in milliseconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Interval between elapsed-time tick broadcasts in seconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            connect_timeout_seconds: default_connect_timeout(),
            max_reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay(),
            tick_interval_seconds: default_tick_interval(),
        }
    }
}

fn default_relay_url() -> String {
    "ws://localhost:3001/ws".to_string()
}

fn default_connect_timeout() -> u64 {
    20
}

fn default_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay() -> u64 {
    1000
}

fn default_tick_interval() -> u64 {
    60
}
