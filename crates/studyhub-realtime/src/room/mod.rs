//! Room management: per-group broadcast scopes.

pub mod registry;
pub mod room;
pub mod subscription;

pub use registry::RoomRegistry;
pub use room::Room;
pub use subscription::SubscriptionTracker;

/// Room name for a study group.
pub fn room_for_group(group_id: uuid::Uuid) -> String {
    format!("group_{group_id}")
}
