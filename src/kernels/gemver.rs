//! Polybench GEMVER: rank-2 update of `A`, transposed matvec into `x`,
//! vector add, matvec into `w`.
//!
//! Four dependent phases; each reads what the previous one wrote, so offload
//! execution issues one launch per phase.
//!
//! Offload timing: as for 2MM, mirroring happens in set-up and after the
//! timer stops; transfer cost is excluded from the timed region.
//!
//! This kernel does not implement the launch-abstraction offload variant.

use crate::consts::DEVICE_BLOCK_SIZE;
use crate::checksum::calc_checksum;
use crate::drivers::{device, host};
use crate::error::HarnessError;
use crate::kernels::{Kernel, KernelBase};
use crate::memory::{self, DeviceMirror, DeviceSpace};
use crate::sizes::{ProblemDimensions, SizeClass};
use crate::utils::Real;
use crate::variant::VariantId;

use std::mem::size_of;

const ALPHA: Real = 1.5;
const BETA: Real = 1.2;

// Role seeds for the reproducible data init; identical across variants.
const SEED_A: u64 = 1;
const SEED_U1: u64 = 2;
const SEED_V1: u64 = 3;
const SEED_U2: u64 = 4;
const SEED_V2: u64 = 5;
const SEED_X: u64 = 6;
const SEED_Y: u64 = 7;
const SEED_Z: u64 = 8;

fn sizes_for(size: SizeClass) -> (usize, usize) {
    // (n, run_reps)
    match size {
        SizeClass::Mini => (40, 20),
        SizeClass::Small => (120, 10),
        SizeClass::Medium => (400, 4),
        SizeClass::Large => (1200, 1),
        SizeClass::ExtraLarge => (2400, 1),
    }
}

/// Size-class mapping for GEMVER. Pure; same class, same dimensions.
pub fn dimensions(size: SizeClass) -> ProblemDimensions {
    let (n, run_reps) = sizes_for(size);
    ProblemDimensions::new(&[("n", n)], run_reps)
}

/// `A[i][j] += u1[i]*v1[j] + u2[i]*v2[j]`. Shared by every variant.
#[inline]
fn a_element(a_ij: Real, u1_i: Real, v1_j: Real, u2_i: Real, v2_j: Real) -> Real {
    a_ij + u1_i * v1_j + u2_i * v2_j
}

/// `x[i] += beta * A^T[i][j] * y[j]` over all `j`. Shared by every variant.
#[inline]
fn x_element(x_i: Real, a: &[Real], y: &[Real], i: usize, n: usize) -> Real {
    let mut dot = x_i;
    for j in 0..n {
        dot += BETA * a[j * n + i] * y[j];
    }
    dot
}

/// `x[i] += z[i]`. Shared by every variant.
#[inline]
fn xz_element(x_i: Real, z_i: Real) -> Real {
    x_i + z_i
}

/// `w[i] += alpha * A[i][j] * x[j]` over all `j`. Shared by every variant.
#[inline]
fn w_element(w_i: Real, a: &[Real], x: &[Real], i: usize, n: usize) -> Real {
    let mut dot = w_i;
    for j in 0..n {
        dot += ALPHA * a[i * n + j] * x[j];
    }
    dot
}

#[derive(Debug)]
struct DeviceData {
    a: DeviceMirror,
    u1: DeviceMirror,
    v1: DeviceMirror,
    u2: DeviceMirror,
    v2: DeviceMirror,
    x: DeviceMirror,
    y: DeviceMirror,
    z: DeviceMirror,
    w: DeviceMirror,
}

pub struct Gemver {
    base: KernelBase,
    n: usize,
    a: Vec<Real>,
    u1: Vec<Real>,
    v1: Vec<Real>,
    u2: Vec<Real>,
    v2: Vec<Real>,
    x: Vec<Real>,
    y: Vec<Real>,
    z: Vec<Real>,
    w: Vec<Real>,
    dev: Option<DeviceData>,
}

impl Gemver {
    pub fn new(size: SizeClass) -> Self {
        let (n, _) = sizes_for(size);
        Self {
            base: KernelBase::new("gemver", dimensions(size)),
            n,
            a: Vec::new(),
            u1: Vec::new(),
            v1: Vec::new(),
            u2: Vec::new(),
            v2: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            w: Vec::new(),
            dev: None,
        }
    }

    fn run_host(&mut self, vid: VariantId) {
        let n = self.n;

        // Phase 1: rank-2 update of A.
        let (u1, v1, u2, v2) = (
            self.u1.as_slice(),
            self.v1.as_slice(),
            self.u2.as_slice(),
            self.v2.as_slice(),
        );
        let phase1 = move |i: usize, row: &mut [Real]| {
            for (j, a_ij) in row.iter_mut().enumerate() {
                *a_ij = a_element(*a_ij, u1[i], v1[j], u2[i], v2[j]);
            }
        };
        match vid {
            VariantId::SeqNaive => host::rows_seq(&mut self.a, n, phase1),
            VariantId::SeqIter => host::rows_iter(&mut self.a, n, phase1),
            VariantId::ParIter => host::rows_par(&mut self.a, n, phase1),
            _ => unreachable!(),
        }

        // Phase 2: x = beta * A^T * y + x, reading the updated A.
        let (a, y) = (self.a.as_slice(), self.y.as_slice());
        let phase2 = move |i: usize, x_i: &mut Real| *x_i = x_element(*x_i, a, y, i, n);
        match vid {
            VariantId::SeqNaive => host::elems_seq(&mut self.x, phase2),
            VariantId::SeqIter => host::elems_iter(&mut self.x, phase2),
            VariantId::ParIter => host::elems_par(&mut self.x, phase2),
            _ => unreachable!(),
        }

        // Phase 3: x += z.
        let z = self.z.as_slice();
        let phase3 = move |i: usize, x_i: &mut Real| *x_i = xz_element(*x_i, z[i]);
        match vid {
            VariantId::SeqNaive => host::elems_seq(&mut self.x, phase3),
            VariantId::SeqIter => host::elems_iter(&mut self.x, phase3),
            VariantId::ParIter => host::elems_par(&mut self.x, phase3),
            _ => unreachable!(),
        }

        // Phase 4: w = alpha * A * x + w.
        let x = self.x.as_slice();
        let phase4 = move |i: usize, w_i: &mut Real| *w_i = w_element(*w_i, a, x, i, n);
        match vid {
            VariantId::SeqNaive => host::elems_seq(&mut self.w, phase4),
            VariantId::SeqIter => host::elems_iter(&mut self.w, phase4),
            VariantId::ParIter => host::elems_par(&mut self.w, phase4),
            _ => unreachable!(),
        }
    }

    fn run_device(&mut self) {
        let n = self.n;
        let dev = match self.dev.as_mut() {
            Some(dev) => dev,
            None => return,
        };

        // Phase 1: one work-item per element of A.
        {
            let (u1, v1, u2, v2) = (
                dev.u1.as_slice(),
                dev.v1.as_slice(),
                dev.u2.as_slice(),
                dev.v2.as_slice(),
            );
            device::launch(dev.a.as_mut_slice(), DEVICE_BLOCK_SIZE, move |ii, a_ij| {
                let (i, j) = (ii / n, ii % n);
                *a_ij = a_element(*a_ij, u1[i], v1[j], u2[i], v2[j]);
            });
        }

        // Each phase reads what the previous launch finished writing.
        {
            let (a, y) = (dev.a.as_slice(), dev.y.as_slice());
            device::launch(dev.x.as_mut_slice(), DEVICE_BLOCK_SIZE, move |i, x_i| {
                *x_i = x_element(*x_i, a, y, i, n);
            });
        }
        {
            let z = dev.z.as_slice();
            device::launch(dev.x.as_mut_slice(), DEVICE_BLOCK_SIZE, move |i, x_i| {
                *x_i = xz_element(*x_i, z[i]);
            });
        }
        {
            let (a, x) = (dev.a.as_slice(), dev.x.as_slice());
            device::launch(dev.w.as_mut_slice(), DEVICE_BLOCK_SIZE, move |i, w_i| {
                *w_i = w_element(*w_i, a, x, i, n);
            });
        }
    }
}

impl Kernel for Gemver {
    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn dimensions(&self) -> &ProblemDimensions {
        self.base.dims()
    }

    fn dimensions_mut(&mut self) -> &mut ProblemDimensions {
        self.base.dims_mut()
    }

    fn supports(&self, vid: VariantId) -> bool {
        vid != VariantId::DevLaunch
    }

    fn set_up(&mut self, vid: VariantId, space: &DeviceSpace) -> Result<(), HarnessError> {
        let n = self.n;

        self.a = memory::alloc_and_init_seeded(n * n, SEED_A)?;
        self.u1 = memory::alloc_and_init_seeded(n, SEED_U1)?;
        self.v1 = memory::alloc_and_init_seeded(n, SEED_V1)?;
        self.u2 = memory::alloc_and_init_seeded(n, SEED_U2)?;
        self.v2 = memory::alloc_and_init_seeded(n, SEED_V2)?;
        self.x = memory::alloc_and_init_seeded(n, SEED_X)?;
        self.y = memory::alloc_and_init_seeded(n, SEED_Y)?;
        self.z = memory::alloc_and_init_seeded(n, SEED_Z)?;
        self.w = memory::alloc_and_init(n, |_| 0.0)?;

        if vid.is_offload() {
            self.dev = Some(DeviceData {
                a: space.mirror_to_device(&self.a)?,
                u1: space.mirror_to_device(&self.u1)?,
                v1: space.mirror_to_device(&self.v1)?,
                u2: space.mirror_to_device(&self.u2)?,
                v2: space.mirror_to_device(&self.v2)?,
                x: space.mirror_to_device(&self.x)?,
                y: space.mirror_to_device(&self.y)?,
                z: space.mirror_to_device(&self.z)?,
                w: space.mirror_to_device(&self.w)?,
            });
        }
        Ok(())
    }

    fn run(&mut self, vid: VariantId) -> Result<(), HarnessError> {
        match vid {
            VariantId::SeqNaive | VariantId::SeqIter | VariantId::ParIter => self.run_host(vid),
            VariantId::DevGrid => self.run_device(),
            VariantId::DevLaunch => unreachable!("advertised as unsupported"),
        }
        Ok(())
    }

    fn sync_outputs(&mut self, vid: VariantId) -> Result<(), HarnessError> {
        if vid.is_offload() {
            if let Some(dev) = self.dev.as_ref() {
                dev.w.copy_to_host(&mut self.w)?;
            }
        }
        Ok(())
    }

    fn update_checksum(&mut self, vid: VariantId) {
        let value = calc_checksum(&self.w);
        self.base.add_to_checksum(vid, value);
    }

    fn checksum(&self, vid: VariantId) -> Option<Real> {
        self.base.checksum(vid)
    }

    fn tear_down(&mut self, _vid: VariantId) {
        self.dev = None;
        self.a = Vec::new();
        self.u1 = Vec::new();
        self.v1 = Vec::new();
        self.u2 = Vec::new();
        self.v2 = Vec::new();
        self.x = Vec::new();
        self.y = Vec::new();
        self.z = Vec::new();
        self.w = Vec::new();
    }

    fn flops_per_rep(&self) -> usize {
        let n = self.n;
        10 * n * n + n
    }

    fn bytes_per_rep(&self) -> usize {
        let n = self.n;
        (n * n + 8 * n) * size_of::<Real>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::run_variant;
    use crate::variant::VariantStatus;

    #[test]
    fn dimensions_are_deterministic() {
        for size in SizeClass::ALL {
            let first = dimensions(size);
            assert_eq!(first, dimensions(size));
            assert!(first.is_valid());
        }
    }

    #[test]
    fn dev_launch_is_unsupported() {
        let space = DeviceSpace::unbounded();
        let mut kernel = Gemver::new(SizeClass::Mini);
        let outcome = run_variant(&mut kernel, VariantId::DevLaunch, &space).unwrap();
        assert_eq!(outcome.status, VariantStatus::Unsupported);
        assert_eq!(outcome.checksum, None);
        assert_eq!(kernel.checksum(VariantId::DevLaunch), None);
    }

    #[test]
    fn supported_variants_agree_on_one_rep() {
        let space = DeviceSpace::unbounded();
        let mut kernel = Gemver::new(SizeClass::Mini);
        kernel.dimensions_mut().run_reps = 1;
        kernel.dimensions_mut().sample_count = 1;

        let mut checksums = Vec::new();
        for vid in [
            VariantId::SeqNaive,
            VariantId::SeqIter,
            VariantId::ParIter,
            VariantId::DevGrid,
        ] {
            let outcome = run_variant(&mut kernel, vid, &space).unwrap();
            assert_eq!(outcome.status, VariantStatus::Ran);
            checksums.push(outcome.checksum.unwrap());
        }
        let reference = checksums[0];
        assert!(reference.is_finite());
        for cs in checksums {
            assert!((cs - reference).abs() <= 1e-9 * reference.abs().max(1.0));
        }
    }
}
