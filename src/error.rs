//! Error taxonomy of the harness.
//!
//! Errors are local to a single variant run unless they indicate host memory
//! exhaustion: a failed device-side allocation or transfer marks that one
//! variant `Skipped`, a failed host allocation aborts the whole run.

use thiserror::Error;

use std::fmt;

/// The memory space an allocation was requested in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemSpace {
    Host,
    Device,
}

impl fmt::Display for MemSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Device => write!(f, "device"),
        }
    }
}

/// Allocation failure in either memory space.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{space} allocation of {requested} elements failed ({available} available)")]
pub struct AllocationError {
    pub space: MemSpace,
    pub requested: usize,
    pub available: usize,
}

/// Failure copying between the host and the device memory space.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("mirror transfer expected {expected} elements, got {actual}")]
pub struct TransferError {
    pub expected: usize,
    pub actual: usize,
}

/// Any failure a kernel lifecycle operation can report to the runner.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl HarnessError {
    /// Only host memory exhaustion escalates beyond the current variant.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::Allocation(AllocationError {
                space: MemSpace::Host,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_allocation_is_fatal() {
        let err = HarnessError::from(AllocationError {
            space: MemSpace::Host,
            requested: 1,
            available: 0,
        });
        assert!(err.is_fatal());
    }

    #[test]
    fn device_failures_are_not_fatal() {
        let alloc = HarnessError::from(AllocationError {
            space: MemSpace::Device,
            requested: 1,
            available: 0,
        });
        let transfer = HarnessError::from(TransferError {
            expected: 4,
            actual: 2,
        });
        assert!(!alloc.is_fatal());
        assert!(!transfer.is_fatal());
    }
}
