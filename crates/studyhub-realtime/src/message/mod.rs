//! Wire message definitions for the presence protocol.

pub mod types;

pub use types::{
    ClientEvent, ServerEvent, SessionSummary, StoppedStudying, StudyingPayload, TimerTick,
};
