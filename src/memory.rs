//! Heterogeneous data management.
//!
//! Host buffers are plain `Vec`s filled by deterministic patterns keyed only
//! by buffer role, never by variant, so every variant of a kernel starts from
//! byte-identical logical input.
//!
//! The secondary memory space is modeled in-process: [`DeviceSpace`] hands
//! out [`DeviceMirror`]s against a fixed element capacity and tracks every
//! live allocation. A mirror is a scoped resource; dropping it returns its
//! reservation on every exit path, including mid-run failures, so no
//! device-side allocation can outlive the variant that created it.

use crate::error::{AllocationError, MemSpace, TransferError};
use crate::utils::{BenchFloat, Real};

use std::cell::Cell;
use std::rc::Rc;

/// Upper bound on a single host buffer request, in elements. Requests above
/// it are treated as host memory exhaustion, which is fatal for the run.
const HOST_ALLOC_LIMIT: usize = 1 << 34;

/// Allocates a host buffer and fills it from a per-index pattern.
pub fn alloc_and_init<F>(len: usize, pattern: F) -> Result<Vec<Real>, AllocationError>
where
    F: FnMut(usize) -> Real,
{
    if len > HOST_ALLOC_LIMIT {
        return Err(AllocationError {
            space: MemSpace::Host,
            requested: len,
            available: HOST_ALLOC_LIMIT,
        });
    }
    Ok((0..len).map(pattern).collect())
}

/// Allocates a host buffer filled from a generator seeded by the buffer's
/// role. The same role seed always reproduces the same contents.
pub fn alloc_and_init_seeded<T: BenchFloat>(
    len: usize,
    role_seed: u64,
) -> Result<Vec<T>, AllocationError> {
    if len > HOST_ALLOC_LIMIT {
        return Err(AllocationError {
            space: MemSpace::Host,
            requested: len,
            available: HOST_ALLOC_LIMIT,
        });
    }
    Ok(T::seeded_fill(len, role_seed))
}

#[derive(Debug)]
struct SpaceState {
    capacity: usize,
    used: Cell<usize>,
    live: Cell<usize>,
}

/// The secondary (accelerator) memory space.
///
/// Capacity is expressed in elements. Cloning shares the underlying space, so
/// the driver and tests can observe the same allocation counters.
#[derive(Clone, Debug)]
pub struct DeviceSpace {
    state: Rc<SpaceState>,
}

impl DeviceSpace {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Rc::new(SpaceState {
                capacity,
                used: Cell::new(0),
                live: Cell::new(0),
            }),
        }
    }

    pub fn unbounded() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Allocates a same-sized region in the device space and copies the host
    /// contents into it. Fails when capacity is exhausted; the failure is
    /// fatal for the requesting variant only.
    pub fn mirror_to_device(&self, host: &[Real]) -> Result<DeviceMirror, AllocationError> {
        let requested = host.len();
        let available = self.state.capacity - self.state.used.get();
        if requested > available {
            return Err(AllocationError {
                space: MemSpace::Device,
                requested,
                available,
            });
        }
        self.state.used.set(self.state.used.get() + requested);
        self.state.live.set(self.state.live.get() + 1);
        Ok(DeviceMirror {
            data: host.to_vec(),
            state: Rc::clone(&self.state),
        })
    }

    /// Number of mirrors currently alive in this space.
    pub fn live_allocations(&self) -> usize {
        self.state.live.get()
    }

    /// Elements currently reserved in this space.
    pub fn used_elements(&self) -> usize {
        self.state.used.get()
    }
}

/// A copy of a host buffer resident in the device memory space.
///
/// Owned by the currently running variant; dropping it releases the
/// reservation.
#[derive(Debug)]
pub struct DeviceMirror {
    data: Vec<Real>,
    state: Rc<SpaceState>,
}

impl DeviceMirror {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.data
    }

    /// Copies the (possibly mutated) device contents back into the host
    /// buffer. Must happen before checksum computation for offload variants.
    pub fn copy_to_host(&self, host: &mut [Real]) -> Result<(), TransferError> {
        if host.len() != self.data.len() {
            return Err(TransferError {
                expected: self.data.len(),
                actual: host.len(),
            });
        }
        host.copy_from_slice(&self.data);
        Ok(())
    }
}

impl Drop for DeviceMirror {
    fn drop(&mut self) {
        self.state.used.set(self.state.used.get() - self.data.len());
        self.state.live.set(self.state.live.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_init_is_idempotent() {
        let a = alloc_and_init(32, |i| (i * i % 7) as Real / 7.0).unwrap();
        let b = alloc_and_init(32, |i| (i * i % 7) as Real / 7.0).unwrap();
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));

        let c: Vec<Real> = alloc_and_init_seeded(32, 3).unwrap();
        let d: Vec<Real> = alloc_and_init_seeded(32, 3).unwrap();
        assert!(c.iter().zip(&d).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn oversized_host_request_is_fatal_flavored() {
        let err = alloc_and_init(HOST_ALLOC_LIMIT + 1, |_| 0.0).unwrap_err();
        assert_eq!(err.space, MemSpace::Host);
    }

    #[test]
    fn mirrors_track_and_release() {
        let space = DeviceSpace::with_capacity(100);
        let host = vec![1.0; 40];
        {
            let m1 = space.mirror_to_device(&host).unwrap();
            let m2 = space.mirror_to_device(&host).unwrap();
            assert_eq!(space.live_allocations(), 2);
            assert_eq!(space.used_elements(), 80);
            assert_eq!(m1.len() + m2.len(), 80);
        }
        assert_eq!(space.live_allocations(), 0);
        assert_eq!(space.used_elements(), 0);
    }

    #[test]
    fn exhausted_space_reports_available() {
        let space = DeviceSpace::with_capacity(50);
        let host = vec![0.0; 40];
        let _m = space.mirror_to_device(&host).unwrap();
        let err = space.mirror_to_device(&host).unwrap_err();
        assert_eq!(err.space, MemSpace::Device);
        assert_eq!(err.requested, 40);
        assert_eq!(err.available, 10);
    }

    #[test]
    fn mirror_round_trip_and_length_check() {
        let space = DeviceSpace::unbounded();
        let host = vec![1.0, 2.0, 3.0];
        let mut mirror = space.mirror_to_device(&host).unwrap();
        mirror.as_mut_slice()[0] = 9.0;

        let mut back = vec![0.0; 3];
        mirror.copy_to_host(&mut back).unwrap();
        assert_eq!(back, vec![9.0, 2.0, 3.0]);

        let mut wrong = vec![0.0; 2];
        assert!(mirror.copy_to_host(&mut wrong).is_err());
    }
}
