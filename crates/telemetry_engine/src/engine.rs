//! Metrics state store, event classifier and snapshot resolver.

use contracts::{EngineConfig, EventKind, MetricsSnapshot, RowerCommand, RowerEvent, TimestampMs};
use observability::EventOutcome;
use tracing::{debug, instrument, trace};

use crate::heart_rate::HeartRateOverride;
use crate::power::StrokePowerAverager;
use crate::pulse::{PulseDetector, PulseTransition};

/// Which value set the resolver presents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    /// Machine freshly reset, everything reads zero
    Reset,
    /// Paddle turning, live values
    Active,
    /// Between strokes or stopped, instantaneous values zeroed
    Standstill,
}

impl PresentationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Active => "active",
            Self::Standstill => "standstill",
        }
    }
}

/// Effect of an operator command on the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    HeartRateUpdated(u32),
    HeartRateUnchanged,
    /// The device has to be reset by its event source
    DeviceResetRequested,
}

/// Display clock fields as last reported by the rower
#[derive(Debug, Clone, Copy, Default)]
struct DisplayClock {
    seconds: u32,
    minutes: u32,
    hours: u32,
}

impl DisplayClock {
    /// Saturates at `u32::MAX` for out-of-range firmware values
    fn elapsed_seconds(&self) -> u32 {
        let total = u64::from(self.hours)
            .saturating_mul(3600)
            .saturating_add(u64::from(self.minutes).saturating_mul(60))
            .saturating_add(u64::from(self.seconds));
        u32::try_from(total).unwrap_or(u32::MAX)
    }
}

/// Rower telemetry engine
#[derive(Debug)]
pub struct TelemetryEngine {
    config: EngineConfig,
    /// Values as the rower last reported them
    live: MetricsSnapshot,
    /// `live` sanitised at the moment the paddle stopped
    standstill: MetricsSnapshot,
    is_reset: bool,
    pulse: PulseDetector,
    power: StrokePowerAverager,
    clock: DisplayClock,
    heart_rate: HeartRateOverride,
    last_state: PresentationState,
}

impl TelemetryEngine {
    pub fn new(config: EngineConfig) -> Self {
        let pulse = PulseDetector::new(config.pulse_timeout_ms);
        let power = StrokePowerAverager::new(config.power_window_strokes);
        let heart_rate = HeartRateOverride::new(config.heart_rate_override_ttl_ms);

        Self {
            config,
            live: MetricsSnapshot::ZERO,
            standstill: MetricsSnapshot::ZERO,
            is_reset: true,
            pulse,
            power,
            clock: DisplayClock::default(),
            heart_rate,
            last_state: PresentationState::Reset,
        }
    }

    /// Feed one event from the source
    ///
    /// Order: reset detection, pulse bookkeeping, classification.
    #[instrument(
        level = "trace",
        name = "telemetry_engine_push",
        skip(self, event),
        fields(kind = %event.kind, value = ?event.value)
    )]
    pub fn push(&mut self, event: &RowerEvent, now_ms: TimestampMs) {
        if event.kind == EventKind::Reset {
            self.reset();
            observability::record_event(event.kind.name(), EventOutcome::Classified);
            self.note_state();
            return;
        }

        if event.kind.is_ignored() {
            observability::record_event(event.kind.name(), EventOutcome::Ignored);
            return;
        }

        if event.kind == EventKind::Pulse {
            self.pulse.observe_pulse(event.at.unwrap_or(now_ms));
            self.is_reset = false;
        }
        self.evaluate_pulse(now_ms);

        let outcome = self.classify(event);
        self.live.elapsed_time_seconds = self.clock.elapsed_seconds();

        observability::record_event(event.kind.name(), outcome);
        self.note_state();
    }

    /// Periodic evaluation, once per bridge tick
    pub fn tick(&mut self, now_ms: TimestampMs) {
        self.evaluate_pulse(now_ms);
        self.note_state();
    }

    /// Snapshot to present at `now_ms`
    ///
    /// Pure: does not touch engine state.
    pub fn resolve(&self, now_ms: TimestampMs) -> MetricsSnapshot {
        let mut snapshot = match self.state() {
            PresentationState::Reset => MetricsSnapshot::ZERO,
            PresentationState::Active => self.live,
            PresentationState::Standstill => self.standstill,
        };

        if snapshot.heart_rate == 0 {
            if let Some(bpm) = self.heart_rate.current(now_ms) {
                snapshot.heart_rate = bpm;
            }
        }
        snapshot
    }

    /// Apply an operator command
    #[instrument(name = "telemetry_engine_command", skip(self))]
    pub fn apply_command(&mut self, command: RowerCommand, now_ms: TimestampMs) -> CommandOutcome {
        match command {
            RowerCommand::SetHeartRate(bpm) => {
                if self.heart_rate.set(bpm, now_ms) {
                    debug!(bpm, "External heart rate updated");
                    CommandOutcome::HeartRateUpdated(bpm)
                } else {
                    CommandOutcome::HeartRateUnchanged
                }
            }
            RowerCommand::ResetDevice => CommandOutcome::DeviceResetRequested,
        }
    }

    /// Back to the zero form. The heart-rate override is kept.
    pub fn reset(&mut self) {
        debug!("Telemetry engine reset");
        self.live = MetricsSnapshot::ZERO;
        self.standstill = MetricsSnapshot::ZERO;
        self.is_reset = true;
        self.pulse.reset();
        self.power.clear();
        self.clock = DisplayClock::default();
    }

    pub fn state(&self) -> PresentationState {
        if self.is_reset {
            PresentationState::Reset
        } else if self.pulse.is_turning() {
            PresentationState::Active
        } else {
            PresentationState::Standstill
        }
    }

    pub fn live(&self) -> &MetricsSnapshot {
        &self.live
    }

    pub fn standstill_snapshot(&self) -> &MetricsSnapshot {
        &self.standstill
    }

    pub fn is_reset(&self) -> bool {
        self.is_reset
    }

    pub fn paddle_turning(&self) -> bool {
        self.pulse.is_turning()
    }

    pub fn stroke_in_progress(&self) -> bool {
        self.power.stroke_in_progress()
    }

    pub fn smoothed_power(&self) -> u32 {
        self.power.smoothed()
    }

    pub fn heart_rate_override(&self) -> &HeartRateOverride {
        &self.heart_rate
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn evaluate_pulse(&mut self, now_ms: TimestampMs) {
        if let Some(PulseTransition::Stopped) = self.pulse.observe_tick(now_ms) {
            self.power.clear();
            self.standstill = self.live.standstill();
            debug!(
                total_distance_m = self.live.total_distance_m,
                "Paddle stopped, standstill captured"
            );
        }
    }

    fn classify(&mut self, event: &RowerEvent) -> EventOutcome {
        let value = event.value_or_zero();

        match &event.kind {
            EventKind::StrokeStart => self.power.on_stroke_start(),
            EventKind::StrokeEnd => {
                let smoothed = self.power.on_stroke_end();
                self.apply_smoothed(smoothed);
            }
            EventKind::Watts => {
                let smoothed = self.power.on_watts(value);
                self.apply_smoothed(smoothed);
            }
            EventKind::StrokeRate => self.live.stroke_rate = value * 2.0,
            EventKind::TotalStrokes => self.live.total_strokes = value as u32,
            EventKind::TotalDistanceM => self.live.total_distance_m = value as u32,
            EventKind::AvgDistanceCmps => {
                if value == 0.0 {
                    self.live.instantaneous_pace = 0.0;
                    self.live.speed = 0.0;
                } else {
                    self.live.instantaneous_pace = 50_000.0 / value;
                    self.live.speed = value;
                }
            }
            EventKind::TotalKcal => self.live.total_kcal = value / 1000.0,
            EventKind::TotalKcalH => {
                self.live.total_kcal_hour = value;
                self.live.total_kcal = 0.0;
            }
            EventKind::TotalKcalMin => {
                self.live.total_kcal_min = value;
                self.live.total_kcal = 0.0;
            }
            EventKind::HeartRate => self.live.heart_rate = value as u32,
            EventKind::DisplaySec => self.clock.seconds = value as u32,
            EventKind::DisplayMin => self.clock.minutes = value as u32,
            EventKind::DisplayHr => self.clock.hours = value as u32,
            EventKind::Pulse => {}
            EventKind::Reset
            | EventKind::Graph
            | EventKind::TankVolume
            | EventKind::DisplaySecDec => return EventOutcome::Ignored,
            EventKind::Other(name) => {
                trace!(kind = %name, "Unknown event kind ignored");
                return EventOutcome::Unknown;
            }
        }
        EventOutcome::Classified
    }

    fn apply_smoothed(&mut self, smoothed: Option<u32>) {
        if let Some(watts) = smoothed {
            self.live.watts = watts;
            observability::record_smoothed_power(watts);
        }
    }

    fn note_state(&mut self) {
        let state = self.state();
        if state != self.last_state {
            trace!(from = self.last_state.as_str(), to = state.as_str(), "State transition");
            observability::record_state_transition(state.as_str());
            self.last_state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TelemetryEngine {
        TelemetryEngine::new(EngineConfig::default())
    }

    fn value(kind: EventKind, v: f64) -> RowerEvent {
        RowerEvent::with_value(kind, v)
    }

    fn row_stroke(engine: &mut TelemetryEngine, samples: &[f64], now_ms: TimestampMs) {
        engine.push(&RowerEvent::pulse(now_ms), now_ms);
        engine.push(&RowerEvent::marker(EventKind::StrokeStart), now_ms);
        for &w in samples {
            engine.push(&value(EventKind::Watts, w), now_ms);
        }
        engine.push(&RowerEvent::marker(EventKind::StrokeEnd), now_ms);
    }

    #[test]
    fn test_initially_reset() {
        let engine = engine();
        assert_eq!(engine.state(), PresentationState::Reset);
        assert_eq!(engine.resolve(1_000), MetricsSnapshot::ZERO);
    }

    #[test]
    fn test_smoothed_power_from_last_four_peaks() {
        let mut engine = engine();
        let mut now = 10_000;
        for samples in [
            &[60.0, 120.0, 90.0][..],
            &[140.0, 30.0][..],
            &[100.0][..],
            &[10.0, 160.0, 150.0][..],
        ] {
            row_stroke(&mut engine, samples, now);
            now += 100;
        }
        assert_eq!(engine.live().watts, 130);
        assert_eq!(engine.smoothed_power(), 130);
        assert_eq!(engine.resolve(now).watts, 130);
    }

    #[test]
    fn test_watts_unchanged_until_window_full() {
        let mut engine = engine();
        row_stroke(&mut engine, &[200.0], 1_000);
        row_stroke(&mut engine, &[200.0], 1_100);
        row_stroke(&mut engine, &[200.0], 1_200);
        assert_eq!(engine.live().watts, 0);
    }

    #[test]
    fn test_pulse_gap_enters_standstill() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(10_000), 10_000);
        engine.push(&value(EventKind::StrokeRate, 12.0), 10_010);
        engine.push(&value(EventKind::AvgDistanceCmps, 250.0), 10_020);
        engine.push(&value(EventKind::TotalDistanceM, 740.0), 10_030);
        engine.push(&value(EventKind::HeartRate, 128.0), 10_040);
        engine.push(&RowerEvent::marker(EventKind::StrokeStart), 10_050);
        engine.push(&value(EventKind::Watts, 180.0), 10_060);
        engine.tick(10_100);
        assert_eq!(engine.state(), PresentationState::Active);
        assert!(engine.stroke_in_progress());

        engine.tick(10_400);
        assert_eq!(engine.state(), PresentationState::Standstill);
        assert!(!engine.paddle_turning());
        assert!(!engine.stroke_in_progress());
        assert_eq!(engine.smoothed_power(), 0);

        let snapshot = engine.resolve(10_400);
        assert_eq!(snapshot.stroke_rate, 0.0);
        assert_eq!(snapshot.instantaneous_pace, 0.0);
        assert_eq!(snapshot.speed, 0.0);
        assert_eq!(snapshot.watts, 0);
        assert_eq!(snapshot.heart_rate, 0);
        assert_eq!(snapshot.total_distance_m, 740);

        // Peak window was emptied: three more strokes are not enough
        row_stroke(&mut engine, &[200.0], 10_500);
        row_stroke(&mut engine, &[200.0], 10_600);
        row_stroke(&mut engine, &[200.0], 10_700);
        assert_eq!(engine.state(), PresentationState::Active);
        assert_eq!(engine.smoothed_power(), 0);
        assert_eq!(engine.live().watts, 0);

        row_stroke(&mut engine, &[200.0], 10_800);
        assert_eq!(engine.live().watts, 200);
    }

    #[test]
    fn test_resume_keeps_last_smoothed_power() {
        let mut engine = engine();
        let mut now = 10_000;
        for peak in [120.0, 140.0, 100.0, 160.0] {
            row_stroke(&mut engine, &[peak], now);
            now += 100;
        }
        assert_eq!(engine.live().watts, 130);

        engine.tick(11_000);
        assert_eq!(engine.state(), PresentationState::Standstill);
        assert_eq!(engine.resolve(11_000).watts, 0);
        assert_eq!(engine.smoothed_power(), 0);

        engine.push(&RowerEvent::pulse(11_050), 11_050);
        assert_eq!(engine.state(), PresentationState::Active);
        assert_eq!(engine.live().watts, 130);
        assert_eq!(engine.resolve(11_050).watts, 130);
    }

    #[test]
    fn test_standstill_captured_once() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(10_000), 10_000);
        engine.push(&value(EventKind::TotalDistanceM, 100.0), 10_000);
        engine.tick(10_500);
        assert_eq!(engine.standstill_snapshot().total_distance_m, 100);

        // Late distance update while stopped does not re-capture
        engine.push(&value(EventKind::TotalDistanceM, 105.0), 10_600);
        engine.tick(10_700);
        assert_eq!(engine.live().total_distance_m, 105);
        assert_eq!(engine.resolve(10_700).total_distance_m, 100);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(5_000), 5_000);
        engine.push(&value(EventKind::StrokeRate, 13.0), 5_000);
        engine.apply_command(RowerCommand::SetHeartRate(90), 5_000);

        let first = engine.resolve(5_050);
        let second = engine.resolve(5_050);
        assert_eq!(first, second);
        assert_eq!(first.stroke_rate, 26.0);
    }

    #[test]
    fn test_reset_then_pulse_leaves_reset() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(1_000), 1_000);
        engine.push(&value(EventKind::TotalDistanceM, 300.0), 1_000);
        engine.push(&RowerEvent::marker(EventKind::Reset), 1_100);

        assert!(engine.is_reset());
        assert_eq!(engine.resolve(1_100), MetricsSnapshot::ZERO);
        assert_eq!(engine.live().total_distance_m, 0);

        engine.push(&RowerEvent::pulse(1_200), 1_250);
        assert_eq!(engine.state(), PresentationState::Active);
        assert_eq!(engine.resolve(1_250), MetricsSnapshot::ZERO);
    }

    #[test]
    fn test_heart_rate_override_age() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(0), 0);
        engine.tick(1_000);
        assert_eq!(engine.state(), PresentationState::Standstill);

        assert_eq!(
            engine.apply_command(RowerCommand::SetHeartRate(72), 100_000),
            CommandOutcome::HeartRateUpdated(72)
        );
        assert_eq!(engine.resolve(110_000).heart_rate, 72);
        assert_eq!(engine.resolve(140_000).heart_rate, 0);
    }

    #[test]
    fn test_device_heart_rate_wins_over_override() {
        let mut engine = engine();
        engine.apply_command(RowerCommand::SetHeartRate(72), 1_000);
        engine.push(&RowerEvent::pulse(1_000), 1_000);
        engine.push(&value(EventKind::HeartRate, 140.0), 1_000);
        assert_eq!(engine.resolve(1_000).heart_rate, 140);
    }

    #[test]
    fn test_override_applies_in_reset_state() {
        let mut engine = engine();
        engine.apply_command(RowerCommand::SetHeartRate(65), 0);
        let snapshot = engine.resolve(1_000);
        assert_eq!(snapshot.heart_rate, 65);
        assert_eq!(snapshot.watts, 0);
    }

    #[test]
    fn test_override_survives_reset() {
        let mut engine = engine();
        engine.apply_command(RowerCommand::SetHeartRate(80), 0);
        engine.push(&RowerEvent::marker(EventKind::Reset), 10);
        assert_eq!(engine.heart_rate_override().value(), 80);
        assert_eq!(
            engine.apply_command(RowerCommand::SetHeartRate(80), 20),
            CommandOutcome::HeartRateUnchanged
        );
    }

    #[test]
    fn test_reset_device_command_is_forwarded() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(0), 0);
        assert_eq!(
            engine.apply_command(RowerCommand::ResetDevice, 0),
            CommandOutcome::DeviceResetRequested
        );
        assert!(!engine.is_reset());
    }

    #[test]
    fn test_pace_and_speed() {
        let mut engine = engine();
        engine.push(&value(EventKind::AvgDistanceCmps, 250.0), 0);
        assert_eq!(engine.live().instantaneous_pace, 200.0);
        assert_eq!(engine.live().speed, 250.0);

        engine.push(&value(EventKind::AvgDistanceCmps, 0.0), 0);
        assert_eq!(engine.live().instantaneous_pace, 0.0);
        assert_eq!(engine.live().speed, 0.0);
    }

    #[test]
    fn test_energy_fields() {
        let mut engine = engine();
        engine.push(&value(EventKind::TotalKcal, 42_500.0), 0);
        assert_eq!(engine.live().total_kcal, 42.5);

        engine.push(&value(EventKind::TotalKcalH, 600.0), 0);
        assert_eq!(engine.live().total_kcal_hour, 600.0);
        assert_eq!(engine.live().total_kcal, 0.0);

        engine.push(&value(EventKind::TotalKcal, 1_000.0), 0);
        engine.push(&value(EventKind::TotalKcalMin, 10.0), 0);
        assert_eq!(engine.live().total_kcal_min, 10.0);
        assert_eq!(engine.live().total_kcal, 0.0);
    }

    #[test]
    fn test_elapsed_time_from_display_clock() {
        let mut engine = engine();
        engine.push(&value(EventKind::DisplayHr, 1.0), 0);
        engine.push(&value(EventKind::DisplayMin, 2.0), 0);
        engine.push(&value(EventKind::DisplaySec, 3.0), 0);
        assert_eq!(engine.live().elapsed_time_seconds, 3723);
    }

    #[test]
    fn test_elapsed_time_saturates_on_huge_hours() {
        let mut engine = engine();
        engine.push(&value(EventKind::DisplayHr, 2_000_000.0), 0);
        engine.push(&value(EventKind::DisplayMin, 59.0), 0);
        assert_eq!(engine.live().elapsed_time_seconds, u32::MAX);

        engine.push(&value(EventKind::DisplayHr, 1_193_046.0), 0);
        engine.push(&value(EventKind::DisplayMin, 0.0), 0);
        assert_eq!(engine.live().elapsed_time_seconds, 4_294_965_600);
    }

    #[test]
    fn test_stroke_counters() {
        let mut engine = engine();
        engine.push(&value(EventKind::TotalStrokes, 57.0), 0);
        engine.push(&value(EventKind::StrokeRate, 11.5), 0);
        assert_eq!(engine.live().total_strokes, 57);
        assert_eq!(engine.live().stroke_rate, 23.0);
    }

    #[test]
    fn test_ignored_and_unknown_events() {
        let mut engine = engine();
        engine.push(&RowerEvent::pulse(1_000), 1_000);
        let before = *engine.live();

        engine.push(&value(EventKind::Graph, 99.0), 5_000);
        engine.push(&value(EventKind::TankVolume, 99.0), 5_000);
        engine.push(&value(EventKind::DisplaySecDec, 9.0), 5_000);
        // Ignored kinds do not even run the pulse evaluation
        assert!(engine.paddle_turning());

        engine.push(&value(EventKind::Other("firmware_extra".into()), 1.0), 1_050);
        assert_eq!(*engine.live(), before);
    }
}
