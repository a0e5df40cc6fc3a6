//! Rolling measured sample rate
//!
//! Purely diagnostic: the producer never sees this value.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    window: Duration,
    window_start: Option<Instant>,
    accumulated: u64,
    measured_rate: Option<f64>,
}

impl ThroughputMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            accumulated: 0,
            measured_rate: None,
        }
    }

    /// Count `samples` arriving at `now`. Returns the freshly published rate
    /// when the window closes.
    pub fn record(&mut self, samples: usize, now: Instant) -> Option<f64> {
        let Some(start) = self.window_start else {
            // the first arrival only opens the window
            self.window_start = Some(now);
            return None;
        };

        self.accumulated += samples as u64;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }

        let rate = self.accumulated as f64 / elapsed.as_secs_f64();
        self.measured_rate = Some(rate);
        self.accumulated = 0;
        self.window_start = Some(now);
        Some(rate)
    }

    /// Last published rate, if a window has completed
    pub fn measured_rate(&self) -> Option<f64> {
        self.measured_rate
    }

    pub fn reset(&mut self) {
        self.window_start = None;
        self.accumulated = 0;
        self.measured_rate = None;
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
