//! Execution-strategy identifiers and per-variant run status.

use clap::ValueEnum;

use std::fmt;

/// One execution strategy for a kernel's arithmetic.
///
/// Every variant dispatches the same kernel body through a different
/// index-space driver; none carries its own formula. Kernels advertise which
/// variants they support, and requesting an unsupported one is a status, not
/// an error.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantId {
    /// Plain nested host loops.
    SeqNaive,
    /// Iterator-expression host loops.
    SeqIter,
    /// Thread-parallel host loops (`rayon`).
    ParIter,
    /// Offload to the device memory space with an explicitly sized grid.
    DevGrid,
    /// Offload through the reusable launch abstraction.
    DevLaunch,
}

impl VariantId {
    pub const ALL: [VariantId; 5] = [
        VariantId::SeqNaive,
        VariantId::SeqIter,
        VariantId::ParIter,
        VariantId::DevGrid,
        VariantId::DevLaunch,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Whether this strategy executes in the secondary memory space.
    pub fn is_offload(self) -> bool {
        matches!(self, VariantId::DevGrid | VariantId::DevLaunch)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeqNaive => write!(f, "Sequential naive"),
            Self::SeqIter => write!(f, "Sequential w/ iterators"),
            Self::ParIter => write!(f, "Parallel w/ iterators"),
            Self::DevGrid => write!(f, "Device grid"),
            Self::DevLaunch => write!(f, "Device launch"),
        }
    }
}

/// How one variant run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantStatus {
    /// Completed the full lifecycle.
    Ran,
    /// The kernel does not implement this variant; nothing was executed.
    Unsupported,
    /// A variant-local failure; remaining variants are unaffected.
    Skipped,
    /// Host memory exhaustion; the whole run aborts.
    Fatal,
}

impl fmt::Display for VariantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ran => write!(f, "ran"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Skipped => write!(f, "skipped"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}
