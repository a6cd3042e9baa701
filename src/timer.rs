//! Wall-clock measurement of the timed repetition loop.

use std::time::{Duration, Instant};

/// Accumulating wall-clock timer.
///
/// `start`/`stop` pairs add to a running total so a timed region can be
/// split; `reset` begins a fresh measurement. Stopping an idle timer is a
/// no-op.
#[derive(Debug, Default)]
pub struct Timer {
    started: Option<Instant>,
    total: Duration,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.total += started.elapsed();
        }
    }

    pub fn reset(&mut self) {
        self.started = None;
        self.total = Duration::ZERO;
    }

    pub fn elapsed(&self) -> Duration {
        self.total
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.total.as_secs_f64()
    }
}

/// Elapsed wall time of one variant's timed region, one entry per outer
/// sample. Reset (recreated) at the start of each variant's timed region.
#[derive(Clone, Debug, Default)]
pub struct TimingRecord {
    samples: Vec<f64>,
}

impl TimingRecord {
    pub fn push_sample(&mut self, secs: f64) {
        self.samples.push(secs);
    }

    /// Per-sample elapsed seconds, in recording order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Accumulated elapsed time across all samples.
    pub fn total(&self) -> f64 {
        self.samples.iter().sum()
    }

    /// Fastest sample, if any sample was taken.
    pub fn min(&self) -> Option<f64> {
        self.samples
            .iter()
            .copied()
            .fold(None, |acc, s| Some(acc.map_or(s, |m: f64| m.min(s))))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
