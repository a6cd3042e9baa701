//! Performance report structures and checksum comparison.
//!
//! This is the reporting collaborator of the suite: it consumes the in-memory
//! per-variant (status, checksum, timing) table the drivers retain, derives
//! performance metrics (runtime statistics, arithmetic intensity, memory
//! bandwidth, GFLOP/s) and applies the tolerance-bounded checksum comparison
//! against a reference variant. The core only produces the numbers; judging
//! them happens here.

use crate::drivers::{KernelRunSummary, VariantOutcome};
use crate::kernels::Kernel;
use crate::utils::Real;
use crate::variant::{VariantId, VariantStatus};

use statistical::{mean, standard_deviation};

use std::fmt;
use std::io::{self, Write};

/// Relative agreement between a candidate checksum and the reference.
pub fn checksums_agree(reference: Real, candidate: Real, rel_tol: Real) -> bool {
    let scale = reference.abs().max(candidate.abs()).max(1.0);
    (reference - candidate).abs() <= rel_tol * scale
}

/// The designated reference is the first variant that actually ran.
pub fn reference_checksum(outcomes: &[VariantOutcome]) -> Option<Real> {
    outcomes
        .iter()
        .find(|o| o.status == VariantStatus::Ran)
        .and_then(|o| o.checksum)
}

/// Performance information and statistics of one (kernel, variant) run.
pub struct PerfReport {
    kernel: &'static str,
    variant: VariantId,
    status: VariantStatus,
    run_reps: usize,
    /// Bytes touched per repetition.
    nb_bytes: usize,
    /// Floating-point operations per repetition.
    nb_flops: usize,
    /// Minimum per-repetition runtime in milliseconds.
    min_time: f64,
    /// Median per-repetition runtime in milliseconds.
    median_time: f64,
    /// Maximum per-repetition runtime in milliseconds.
    max_time: f64,
    /// Average per-repetition runtime in milliseconds.
    avg_time: f64,
    /// Runtime standard deviation.
    stddev_time: f64,
    /// Arithmetic intensity in FLOPs/byte.
    arithmetic_intensity: f64,
    /// Memory bandwidth in GiB/s.
    memory_bandwidth: f64,
    /// Computational performance in GFLOP/s.
    computational_performance: f64,
    checksum: Option<Real>,
    /// Agreement with the reference variant; absent when either side is.
    checksum_ok: Option<bool>,
}

impl PerfReport {
    pub fn print_csv_header(output: &mut dyn Write) -> io::Result<()> {
        writeln!(
            output,
            "kernel,variant,status,reps,Bytes,FLOPs,min_runtime,median_runtime,max_runtime,avg_runtime,stddev,FLOPs/Byte,GiB/s,GFLOP/s,checksum,checksum_ok"
        )
    }

    fn new(
        kernel: &dyn Kernel,
        outcome: &VariantOutcome,
        reference: Option<Real>,
        rel_tol: Real,
    ) -> Self {
        let run_reps = kernel.dimensions().run_reps;
        let nb_flops = kernel.flops_per_rep();
        let nb_bytes = kernel.bytes_per_rep();

        // Per-repetition durations in seconds, one entry per outer sample.
        let mut durations: Vec<f64> = outcome
            .timing
            .as_ref()
            .map(|t| t.samples().iter().map(|s| s / run_reps as f64).collect())
            .unwrap_or_default();
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let (min_time, median_time, max_time, avg_time, stddev_time, bandwidth, perf) =
            if durations.is_empty() {
                (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
            } else {
                let avg_secs = mean(&durations);
                let stddev = if durations.len() >= 2 {
                    standard_deviation(&durations, Some(avg_secs))
                } else {
                    0.0
                };
                (
                    durations[0] * 1e3,
                    durations[durations.len() / 2] * 1e3,
                    durations[durations.len() - 1] * 1e3,
                    avg_secs * 1e3,
                    stddev,
                    nb_bytes as f64 / 1024_f64.powi(3) / avg_secs,
                    nb_flops as f64 / (1024_f64.powi(3) * avg_secs),
                )
            };

        let checksum_ok = match (reference, outcome.checksum, outcome.status) {
            (Some(r), Some(c), VariantStatus::Ran) => Some(checksums_agree(r, c, rel_tol)),
            _ => None,
        };

        Self {
            kernel: kernel.name(),
            variant: outcome.vid,
            status: outcome.status,
            run_reps,
            nb_bytes,
            nb_flops,
            min_time,
            median_time,
            max_time,
            avg_time,
            stddev_time,
            arithmetic_intensity: nb_flops as f64 / nb_bytes as f64,
            memory_bandwidth: bandwidth,
            computational_performance: perf,
            checksum: outcome.checksum,
            checksum_ok,
        }
    }
}

/// Builds one report row per variant outcome of a kernel's run.
pub fn reports_for(
    kernel: &dyn Kernel,
    summary: &KernelRunSummary,
    rel_tol: Real,
) -> Vec<PerfReport> {
    let reference = reference_checksum(&summary.outcomes);
    summary
        .outcomes
        .iter()
        .map(|outcome| PerfReport::new(kernel, outcome, reference, rel_tol))
        .collect()
}

impl fmt::Display for PerfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checksum = self
            .checksum
            .map(|c| format!("{c:.9e}"))
            .unwrap_or_default();
        let checksum_ok = self
            .checksum_ok
            .map(|ok| ok.to_string())
            .unwrap_or_default();
        write!(
            f,
            "{},{},{},{},{},{},{:18.15},{:18.15},{:18.15},{:18.15},{},{},{},{},{},{}",
            self.kernel,
            self.variant,
            self.status,
            self.run_reps,
            self.nb_bytes,
            self.nb_flops,
            self.min_time,
            self.median_time,
            self.max_time,
            self.avg_time,
            self.stddev_time,
            self.arithmetic_intensity,
            self.memory_bandwidth,
            self.computational_performance,
            checksum,
            checksum_ok,
        )
    }
}
