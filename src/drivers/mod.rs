//! Variant execution drivers.
//!
//! This module orchestrates the benchmark-kernel lifecycle, one execution
//! strategy at a time. It abstracts over where a kernel's arithmetic runs,
//! on the host (sequential, iterator-based or thread-parallel) or in the
//! device memory space, while keeping the protocol identical for every
//! strategy.
//!
//! # Lifecycle of one variant
//! ## 1. Set-up
//! The kernel allocates and initializes its host buffers, mirroring them into
//! the device space for offload variants. Initialization is keyed by buffer
//! role only, so every variant starts from identical logical input.
//!
//! ## 2. Timing
//! The timed region covers `run_reps` dispatches of the kernel body and
//! nothing else: allocation, initialization and device mirroring happen
//! outside it, unless a kernel documents that transfer cost is part of what
//! it measures. Outer samples repeat the region to give min/mean statistics
//! for very cheap kernels.
//!
//! ## 3. Checksum update
//! Device data is mirrored back where needed, then the output buffer is
//! reduced into the kernel's running checksum for this variant. Comparing
//! checksums across variants is the report layer's job, not ours.
//!
//! ## 4. Tear-down
//! All buffers, host and mirrored, are released. Tear-down runs on every
//! path, including failures, so no allocation survives a variant run.

pub mod device;
pub mod host;

use crate::error::HarnessError;
use crate::kernels::Kernel;
use crate::memory::DeviceSpace;
use crate::timer::{Timer, TimingRecord};
use crate::utils::Real;
use crate::variant::{VariantId, VariantStatus};

use tracing::{debug, info, warn};

/// Lifecycle states a variant run moves through, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunnerState {
    SetUp,
    Timing,
    ChecksumUpdate,
    TornDown,
}

/// Everything one variant run produced: a status plus whatever checksum and
/// timing values existed when it ended.
#[derive(Clone, Debug)]
pub struct VariantOutcome {
    pub vid: VariantId,
    pub status: VariantStatus,
    pub checksum: Option<Real>,
    pub timing: Option<TimingRecord>,
}

/// Per-kernel result table: one outcome per requested variant, in request
/// order, plus the fatal error that cut the iteration short, if any.
#[derive(Debug)]
pub struct KernelRunSummary {
    pub kernel: &'static str,
    pub outcomes: Vec<VariantOutcome>,
    pub fatal: Option<HarnessError>,
}

/// Runs the full lifecycle of one kernel under one execution strategy.
///
/// Variant-local failures resolve to a `Skipped` outcome with tear-down
/// guaranteed; only host memory exhaustion surfaces as `Err`.
pub fn run_variant(
    kernel: &mut dyn Kernel,
    vid: VariantId,
    space: &DeviceSpace,
) -> Result<VariantOutcome, HarnessError> {
    let name = kernel.name();

    if !kernel.supports(vid) {
        debug!(kernel = name, variant = %vid, "variant unsupported");
        return Ok(VariantOutcome {
            vid,
            status: VariantStatus::Unsupported,
            checksum: None,
            timing: None,
        });
    }

    debug!(kernel = name, variant = %vid, state = ?RunnerState::SetUp, "enter");
    if let Err(err) = kernel.set_up(vid, space) {
        kernel.tear_down(vid);
        if err.is_fatal() {
            return Err(err);
        }
        warn!(kernel = name, variant = %vid, error = %err, "variant skipped during set-up");
        return Ok(VariantOutcome {
            vid,
            status: VariantStatus::Skipped,
            checksum: kernel.checksum(vid),
            timing: None,
        });
    }

    let (run_reps, sample_count) = {
        let dims = kernel.dimensions();
        (dims.run_reps, dims.sample_count)
    };

    debug!(kernel = name, variant = %vid, run_reps, sample_count,
           state = ?RunnerState::Timing, "enter");
    let mut timing = TimingRecord::default();
    let mut timer = Timer::new();
    for _ in 0..sample_count {
        timer.reset();
        timer.start();
        for _irep in 0..run_reps {
            if let Err(err) = kernel.run(vid) {
                timer.stop();
                kernel.tear_down(vid);
                if err.is_fatal() {
                    return Err(err);
                }
                warn!(kernel = name, variant = %vid, error = %err, "variant skipped mid-run");
                return Ok(VariantOutcome {
                    vid,
                    status: VariantStatus::Skipped,
                    checksum: kernel.checksum(vid),
                    timing: Some(timing),
                });
            }
        }
        timer.stop();
        timing.push_sample(timer.elapsed_secs());
    }

    debug!(kernel = name, variant = %vid, state = ?RunnerState::ChecksumUpdate, "enter");
    if let Err(err) = kernel.sync_outputs(vid) {
        kernel.tear_down(vid);
        if err.is_fatal() {
            return Err(err);
        }
        warn!(kernel = name, variant = %vid, error = %err, "variant skipped during mirror-back");
        return Ok(VariantOutcome {
            vid,
            status: VariantStatus::Skipped,
            checksum: kernel.checksum(vid),
            timing: Some(timing),
        });
    }
    kernel.update_checksum(vid);

    kernel.tear_down(vid);
    debug!(kernel = name, variant = %vid, state = ?RunnerState::TornDown, "enter");
    info!(kernel = name, variant = %vid, total_secs = timing.total(), "variant complete");

    Ok(VariantOutcome {
        vid,
        status: VariantStatus::Ran,
        checksum: kernel.checksum(vid),
        timing: Some(timing),
    })
}

/// Iterates the ordered set of requested execution strategies for one kernel,
/// strictly sequentially, retaining per-variant checksums and timings.
///
/// The summary stores values; judging them (tolerance comparison against a
/// reference variant) belongs to the report layer.
pub fn run_kernel(
    kernel: &mut dyn Kernel,
    variants: &[VariantId],
    space: &DeviceSpace,
) -> KernelRunSummary {
    let mut outcomes = Vec::with_capacity(variants.len());
    for &vid in variants {
        match run_variant(kernel, vid, space) {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                outcomes.push(VariantOutcome {
                    vid,
                    status: VariantStatus::Fatal,
                    checksum: kernel.checksum(vid),
                    timing: None,
                });
                return KernelRunSummary {
                    kernel: kernel.name(),
                    outcomes,
                    fatal: Some(err),
                };
            }
        }
    }
    KernelRunSummary {
        kernel: kernel.name(),
        outcomes,
        fatal: None,
    }
}
