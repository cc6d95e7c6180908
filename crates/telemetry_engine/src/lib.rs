//! # Telemetry Engine
//!
//! Turns discrete rower events into a continuously resolvable metrics snapshot.
//!
//! Responsible for:
//! - Event classification into the live metric set
//! - Flywheel pulse tracking and standstill detection
//! - Per-stroke peak power smoothing
//! - External heart-rate override
//! - Resolving the snapshot presented for the current tick
//!
//! ## Example
//!
//! ```ignore
//! use telemetry_engine::{EngineConfig, TelemetryEngine};
//!
//! let mut engine = TelemetryEngine::new(EngineConfig::default());
//!
//! // Push events as they arrive
//! engine.push(&event, now_ms);
//!
//! // Once per tick
//! engine.tick(now_ms);
//! let snapshot = engine.resolve(now_ms);
//! ```

mod engine;
mod heart_rate;
mod power;
mod pulse;

pub use contracts::{EngineConfig, EventKind, MetricsSnapshot, RowerCommand, RowerEvent};
pub use engine::{CommandOutcome, PresentationState, TelemetryEngine};
pub use heart_rate::HeartRateOverride;
pub use power::StrokePowerAverager;
pub use pulse::{PulseDetector, PulseTransition};
