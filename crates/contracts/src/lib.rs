//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the rower bridge.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are wall-clock milliseconds (`u64`), stamped by the event source
//! - The bridge loop passes its own `now_ms` into every time-sensitive operation,
//!   so the engine itself never reads a clock

mod blueprint;
mod command;
mod engine_config;
mod error;
mod event;
mod event_source;
mod sink;
mod snapshot;

pub use blueprint::*;
pub use command::RowerCommand;
pub use engine_config::EngineConfig;
pub use error::*;
pub use event::{EventKind, RowerEvent};
pub use event_source::{EventCallback, EventSource};
pub use sink::*;
pub use snapshot::MetricsSnapshot;

/// Wall-clock timestamp in milliseconds.
pub type TimestampMs = u64;
