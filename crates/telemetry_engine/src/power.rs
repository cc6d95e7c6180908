//! Per-stroke peak power smoothing.

use std::collections::VecDeque;

/// Averages the peak power of the last N completed strokes
#[derive(Debug, Clone)]
pub struct StrokePowerAverager {
    capacity: usize,
    in_progress: bool,
    stroke_peak: f64,
    peaks: VecDeque<f64>,
    smoothed: u32,
}

impl StrokePowerAverager {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            in_progress: false,
            stroke_peak: 0.0,
            peaks: VecDeque::with_capacity(capacity + 1),
            smoothed: 0,
        }
    }

    pub fn on_stroke_start(&mut self) {
        self.in_progress = true;
    }

    /// Close the current stroke
    ///
    /// Returns the new smoothed power when the window is full.
    pub fn on_stroke_end(&mut self) -> Option<u32> {
        self.in_progress = false;
        self.flush_peak()
    }

    /// Feed a power sample
    ///
    /// Inside a stroke only the maximum is kept. Outside a stroke the sample
    /// flushes any pending peak instead.
    pub fn on_watts(&mut self, watts: f64) -> Option<u32> {
        if self.in_progress {
            if watts > self.stroke_peak {
                self.stroke_peak = watts;
            }
            None
        } else {
            self.flush_peak()
        }
    }

    /// Drop all accumulated stroke state
    pub fn clear(&mut self) {
        self.in_progress = false;
        self.stroke_peak = 0.0;
        self.peaks.clear();
        self.smoothed = 0;
    }

    pub fn smoothed(&self) -> u32 {
        self.smoothed
    }

    pub fn stroke_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn window_len(&self) -> usize {
        self.peaks.len()
    }

    fn flush_peak(&mut self) -> Option<u32> {
        if self.stroke_peak > 0.0 {
            self.peaks.push_back(self.stroke_peak);
            while self.peaks.len() > self.capacity {
                self.peaks.pop_front();
            }
        }
        self.stroke_peak = 0.0;

        if self.peaks.len() == self.capacity {
            let mean = self.peaks.iter().sum::<f64>() / self.capacity as f64;
            self.smoothed = mean.floor() as u32;
            Some(self.smoothed)
        } else {
            None
        }
    }
}
