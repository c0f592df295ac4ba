//! # studyhub-api
//!
//! The HTTP surface of StudyHub: REST handlers for sessions, profiles,
//! groups, and achievements, plus the WebSocket endpoint hosting the
//! presence relay.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
