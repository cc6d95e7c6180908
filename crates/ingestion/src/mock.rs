//! Mock 划船机
//!
//! 用于无真实设备环境的开发与测试。

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{ContractError, EventCallback, EventKind, EventSource, RowerEvent};
use tracing::{debug, trace};

use crate::clock::wall_clock_ms;

/// Mock 划船机配置
#[derive(Debug, Clone)]
pub struct MockRowerConfig {
    /// 事件源名称
    pub name: String,

    /// 桨频 (次/分钟)
    pub stroke_rate_spm: f64,

    /// 每桨峰值功率 (W)
    pub peak_watts: f64,

    /// 划行时飞轮脉冲周期 (ms)
    pub pulse_interval_ms: u64,
}

impl Default for MockRowerConfig {
    fn default() -> Self {
        Self {
            name: "mock_rower".to_string(),
            stroke_rate_spm: 24.0,
            peak_watts: 150.0,
            pulse_interval_ms: 50,
        }
    }
}

/// Session counters as the rower's own display would show them
#[derive(Debug, Default)]
struct Session {
    rowing_ms: u64,
    in_drive: bool,
    strokes: u32,
    distance_m: f64,
    calories: f64,
}

/// Mock 划船机事件源
///
/// 后台线程生成脉冲、划桨标记、功率采样以及每秒一次的显示字段。
/// `pause` 模拟运动员松开手柄。
pub struct MockRower {
    config: MockRowerConfig,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    reset_pending: Arc<AtomicBool>,
}

impl MockRower {
    pub fn new(config: MockRowerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            reset_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 停止划行（`resume` 之前不产生任何事件）
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn config(&self) -> &MockRowerConfig {
        &self.config
    }
}

impl EventSource for MockRower {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn listen(&self, callback: EventCallback) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let reset_pending = Arc::clone(&self.reset_pending);

        thread::spawn(move || {
            debug!(
                source = %config.name,
                stroke_rate_spm = config.stroke_rate_spm,
                "mock rower started"
            );

            let step_ms = config.pulse_interval_ms.max(1);
            let mut session = Session::default();

            while running.load(Ordering::Relaxed) {
                if reset_pending.swap(false, Ordering::SeqCst) {
                    session = Session::default();
                    callback(RowerEvent::marker(EventKind::Reset).at(wall_clock_ms()));
                } else if !paused.load(Ordering::Relaxed) {
                    step(&config, &mut session, step_ms, &callback);
                }
                thread::sleep(Duration::from_millis(step_ms));
            }

            debug!(source = %config.name, "mock rower stopped");
        });
    }

    fn request_reset(&self) -> Result<(), ContractError> {
        if !self.is_listening() {
            return Err(ContractError::event_source(
                &self.config.name,
                "reset requested while not listening",
            ));
        }
        self.reset_pending.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Advance the simulated session by one pulse period
fn step(config: &MockRowerConfig, session: &mut Session, step_ms: u64, emit: &EventCallback) {
    let now = wall_clock_ms();
    emit(RowerEvent::pulse(now));

    let stroke_ms = (60_000.0 / config.stroke_rate_spm.max(1.0)) as u64;
    let drive_ms = (stroke_ms * 2 / 5).max(1);
    let phase = session.rowing_ms % stroke_ms.max(1);

    if phase < step_ms {
        session.in_drive = true;
        emit(RowerEvent::marker(EventKind::StrokeStart).at(now));
    }

    if session.in_drive {
        if phase >= drive_ms {
            session.in_drive = false;
            session.strokes += 1;
            emit(RowerEvent::marker(EventKind::StrokeEnd).at(now));
            emit(RowerEvent::with_value(EventKind::TotalStrokes, f64::from(session.strokes)).at(now));
            // Firmware reports half the stroke rate
            emit(RowerEvent::with_value(EventKind::StrokeRate, config.stroke_rate_spm / 2.0).at(now));
        } else {
            let watts = config.peak_watts * (PI * phase as f64 / drive_ms as f64).sin();
            emit(RowerEvent::with_value(EventKind::Watts, watts.max(0.0).round()).at(now));
        }
    }

    // Concept2 relation: watts = 2.80 * v^3
    let speed_mps = (config.peak_watts.max(0.0) / 2.8).cbrt();
    session.distance_m += speed_mps * step_ms as f64 / 1000.0;
    session.calories += (config.peak_watts * 4.0 + 300.0) / 3.6 * step_ms as f64 / 1000.0;

    let before = session.rowing_ms;
    session.rowing_ms += step_ms;
    if session.rowing_ms / 1000 != before / 1000 {
        let elapsed_s = session.rowing_ms / 1000;
        let display = [
            (EventKind::TotalDistanceM, session.distance_m.floor()),
            (EventKind::AvgDistanceCmps, (speed_mps * 100.0).round()),
            (EventKind::TotalKcal, session.calories.floor()),
            (EventKind::DisplaySec, (elapsed_s % 60) as f64),
            (EventKind::DisplayMin, (elapsed_s / 60 % 60) as f64),
            (EventKind::DisplayHr, (elapsed_s / 3600) as f64),
            (EventKind::TankVolume, 17.0),
        ];
        for (kind, value) in display {
            emit(RowerEvent::with_value(kind, value).at(now));
        }
        trace!(elapsed_s, strokes = session.strokes, "mock rower display update");
    }
}
