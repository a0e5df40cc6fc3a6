//! Adaptive pacing: converts irregular timer callbacks into whole samples
//!
//! Each tick turns the elapsed wall time into a fractional sample budget. The
//! whole part is emitted and the remainder (the sample debt) is carried into
//! the next tick, so the long-run rate matches the nominal rate no matter how
//! jittery the callbacks are.

use std::time::{Duration, Instant};

/// What a single tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerStep {
    /// First tick after (re)start; only records the time
    Baseline,
    /// Not enough time elapsed for a whole sample
    Idle,
    /// Emit `count` samples starting at `start_index`
    Emit { start_index: u64, count: usize },
    /// The gap since the last tick was too long; restarted without backfilling
    Resync { gap: Duration },
}

#[derive(Debug, Clone)]
pub struct Pacer {
    sample_rate: f64,
    max_gap: Duration,
    last_tick: Option<Instant>,
    sample_debt: f64,
    sample_index: u64,
}

impl Pacer {
    /// `resume_gap_factor` multiplies `nominal_tick` to give the longest gap
    /// that is still paced normally.
    pub fn new(sample_rate: f32, nominal_tick: Duration, resume_gap_factor: f32) -> Self {
        Self {
            sample_rate: f64::from(sample_rate),
            max_gap: nominal_tick.mul_f64(f64::from(resume_gap_factor.max(1.0))),
            last_tick: None,
            sample_debt: 0.0,
            sample_index: 0,
        }
    }

    /// Advance the pacer to `now`
    pub fn advance(&mut self, now: Instant) -> PacerStep {
        let Some(last) = self.last_tick.replace(now) else {
            return PacerStep::Baseline;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed > self.max_gap {
            self.sample_debt = 0.0;
            return PacerStep::Resync { gap: elapsed };
        }

        let exact = elapsed.as_secs_f64() * self.sample_rate + self.sample_debt;
        let whole = exact.floor();
        self.sample_debt = exact - whole;

        let count = whole as usize;
        if count == 0 {
            return PacerStep::Idle;
        }

        let start_index = self.sample_index;
        self.sample_index += count as u64;
        PacerStep::Emit { start_index, count }
    }

    /// Forget the last tick time and any carried debt.
    ///
    /// The next `advance` becomes a fresh baseline, so time spent stopped or
    /// paused is never replayed as one huge frame.
    pub fn reset(&mut self) {
        self.last_tick = None;
        self.sample_debt = 0.0;
    }

    /// `reset` plus rewinding the sample index to zero
    pub fn rewind(&mut self) {
        self.reset();
        self.sample_index = 0;
    }

    /// Fractional sample budget carried to the next tick, always in [0, 1)
    pub fn sample_debt(&self) -> f64 {
        self.sample_debt
    }

    /// Index of the next sample to be emitted
    pub fn sample_index(&self) -> u64 {
        self.sample_index
    }

    pub fn max_gap(&self) -> Duration {
        self.max_gap
    }

    pub fn has_baseline(&self) -> bool {
        self.last_tick.is_some()
    }
}
