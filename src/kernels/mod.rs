//! Kernel implementations and the lifecycle contract they share.
//!
//! A kernel is one benchmark's arithmetic specification plus its per-variant
//! lifecycle. The arithmetic lives in a single set of per-element functions
//! inside each kernel module; variants differ only in the index-space driver
//! that invokes them, never in the math.

pub mod gemver;
pub mod mat_mat_shared;
pub mod two_mm;

use crate::checksum::ChecksumTable;
use crate::error::HarnessError;
use crate::memory::DeviceSpace;
use crate::sizes::{ProblemDimensions, SizeClass};
use crate::utils::Real;
use crate::variant::VariantId;

use clap::ValueEnum;

use std::fmt;

/// Public contract of one benchmark kernel, consumed by the variant drivers
/// and the report layer.
///
/// The same kernel object is reused across every variant of one size class.
/// Buffers are created in `set_up`, mutated by `run` (one timed repetition
/// per call), read by `update_checksum`, and released in `tear_down`;
/// reallocation per variant guarantees no variant observes a predecessor's
/// state.
pub trait Kernel {
    fn name(&self) -> &'static str;

    fn dimensions(&self) -> &ProblemDimensions;

    /// Pre-run override hook for repetition/sample counts. Must not be called
    /// once the first `set_up` has happened.
    fn dimensions_mut(&mut self) -> &mut ProblemDimensions;

    /// Whether this kernel implements the given execution strategy.
    fn supports(&self, vid: VariantId) -> bool;

    /// Whether host-device transfer happens inside the timed region for
    /// offload variants. Fixed per kernel type and documented there.
    fn transfer_in_timed_region(&self) -> bool {
        false
    }

    /// Allocates and initializes all buffers for one variant run. Initial
    /// host contents depend only on buffer role, never on `vid`.
    fn set_up(&mut self, vid: VariantId, space: &DeviceSpace) -> Result<(), HarnessError>;

    /// One timed repetition of the kernel body under `vid`'s index-space
    /// driver.
    fn run(&mut self, vid: VariantId) -> Result<(), HarnessError>;

    /// Blocks until offloaded results are visible on the host (mirror-back).
    /// No-op for host variants.
    fn sync_outputs(&mut self, vid: VariantId) -> Result<(), HarnessError>;

    /// Reduces the output buffer into the running checksum for `vid`.
    fn update_checksum(&mut self, vid: VariantId);

    /// Releases every buffer of the current variant run, host and mirrored.
    fn tear_down(&mut self, vid: VariantId);

    /// Running checksum for `vid`, if that variant ever updated it.
    fn checksum(&self, vid: VariantId) -> Option<Real>;

    /// Floating-point work per repetition, for derived GFLOP/s.
    fn flops_per_rep(&self) -> usize;

    /// Bytes touched per repetition, for derived bandwidth.
    fn bytes_per_rep(&self) -> usize;
}

/// State every kernel shares: its dimensions and the per-variant running
/// checksums.
#[derive(Debug)]
pub struct KernelBase {
    name: &'static str,
    dims: ProblemDimensions,
    checksums: ChecksumTable,
}

impl KernelBase {
    pub fn new(name: &'static str, dims: ProblemDimensions) -> Self {
        Self {
            name,
            dims,
            checksums: ChecksumTable::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dims(&self) -> &ProblemDimensions {
        &self.dims
    }

    pub fn dims_mut(&mut self) -> &mut ProblemDimensions {
        &mut self.dims
    }

    pub fn add_to_checksum(&mut self, vid: VariantId, value: Real) {
        self.checksums.add(vid, value);
    }

    pub fn checksum(&self, vid: VariantId) -> Option<Real> {
        self.checksums.get(vid)
    }
}

/// The kernels this suite ships, for CLI selection.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelId {
    TwoMm,
    Gemver,
    MatMatShared,
}

impl KernelId {
    pub const ALL: [KernelId; 3] = [KernelId::TwoMm, KernelId::Gemver, KernelId::MatMatShared];

    pub fn construct(self, size: SizeClass) -> Box<dyn Kernel> {
        match self {
            KernelId::TwoMm => Box::new(two_mm::TwoMm::new(size)),
            KernelId::Gemver => Box::new(gemver::Gemver::new(size)),
            KernelId::MatMatShared => Box::new(mat_mat_shared::MatMatShared::new(size)),
        }
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoMm => write!(f, "2mm"),
            Self::Gemver => write!(f, "gemver"),
            Self::MatMatShared => write!(f, "mat_mat_shared"),
        }
    }
}
