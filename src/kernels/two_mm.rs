//! Polybench 2MM: `D := beta*D + (alpha*A*B)*C`, staged through a `tmp`
//! buffer.
//!
//! Two dependent phases: phase 1 writes `tmp`, phase 2 reads it. Offload
//! variants separate the phases with a completed launch.
//!
//! Offload timing: mirroring happens in set-up and after the timer stops, so
//! transfer cost is excluded from this kernel's timed region.

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

fn sizes_for(size: SizeClass) -> (usize, usize, usize, usize, usize) {
    // (ni, nj, nk, nl, run_reps); dimensions follow the polybench suite.
    match size {
        SizeClass::Mini => (16, 18, 22, 24, 500),
        SizeClass::Small => (40, 50, 70, 80, 100),
        SizeClass::Medium => (180, 190, 210, 220, 20),
        SizeClass::Large => (800, 900, 1100, 1200, 2),
        SizeClass::ExtraLarge => (1600, 1800, 2200, 2400, 1),
    }
}

/// Size-class mapping for 2MM. Pure; same class, same dimensions.
pub fn dimensions(size: SizeClass) -> ProblemDimensions {
    let (ni, nj, nk, nl, run_reps) = sizes_for(size);
    ProblemDimensions::new(&[("ni", ni), ("nj", nj), ("nk", nk), ("nl", nl)], run_reps)
}

/// One element of `tmp = alpha*A*B`. Shared by every variant.
#[inline]
fn tmp_element(a: &[Real], b: &[Real], i: usize, j: usize, nj: usize, nk: usize) -> Real {
    let mut acc = 0.0;
    for k in 0..nk {
        acc += ALPHA * a[i * nk + k] * b[k * nj + j];
    }
    acc
}

/// One element of `D = beta*D + tmp*C`. Shared by every variant.
#[inline]
fn d_element(
    d_il: Real,
    tmp: &[Real],
    c: &[Real],
    i: usize,
    l: usize,
    nj: usize,
    nl: usize,
) -> Real {
    let mut acc = d_il * BETA;
    for j in 0..nj {
        acc += tmp[i * nj + j] * c[j * nl + l];
    }
    acc
}

/// Device mirrors of one offload variant's run. Dropping the struct releases
/// every reservation.
#[derive(Debug)]
struct DeviceData {
    tmp: DeviceMirror,
    a: DeviceMirror,
    b: DeviceMirror,
    c: DeviceMirror,
    d: DeviceMirror,
}

pub struct TwoMm {
    base: KernelBase,
    ni: usize,
    nj: usize,
    nk: usize,
    nl: usize,
    tmp: Vec<Real>,
    a: Vec<Real>,
    b: Vec<Real>,
    c: Vec<Real>,
    d: Vec<Real>,
    dev: Option<DeviceData>,
}

impl TwoMm {
    pub fn new(size: SizeClass) -> Self {
        let (ni, nj, nk, nl, _) = sizes_for(size);
        Self {
            base: KernelBase::new("2mm", dimensions(size)),
            ni,
            nj,
            nk,
            nl,
            tmp: Vec::new(),
            a: Vec::new(),
            b: Vec::new(),
            c: Vec::new(),
            d: Vec::new(),
            dev: None,
        }
    }

    fn run_host(&mut self, vid: VariantId) {
        let (nj, nk, nl) = (self.nj, self.nk, self.nl);
        let (a, b, c) = (self.a.as_slice(), self.b.as_slice(), self.c.as_slice());

        let phase1 = move |i: usize, row: &mut [Real]| {
            for (j, t) in row.iter_mut().enumerate() {
                *t = tmp_element(a, b, i, j, nj, nk);
            }
        };
        match vid {
            VariantId::SeqNaive => host::rows_seq(&mut self.tmp, nj, phase1),
            VariantId::SeqIter => host::rows_iter(&mut self.tmp, nj, phase1),
            VariantId::ParIter => host::rows_par(&mut self.tmp, nj, phase1),
            _ => unreachable!(),
        }

        let tmp = self.tmp.as_slice();
        let phase2 = move |i: usize, row: &mut [Real]| {
            for (l, v) in row.iter_mut().enumerate() {
                *v = d_element(*v, tmp, c, i, l, nj, nl);
            }
        };
        match vid {
            VariantId::SeqNaive => host::rows_seq(&mut self.d, nl, phase2),
            VariantId::SeqIter => host::rows_iter(&mut self.d, nl, phase2),
            VariantId::ParIter => host::rows_par(&mut self.d, nl, phase2),
            _ => unreachable!(),
        }
    }

    fn run_device(&mut self, vid: VariantId) {
        let (nj, nk, nl) = (self.nj, self.nk, self.nl);
        let n_tmp = self.ni * self.nj;
        let n_d = self.ni * self.nl;
        // Mirrors exist whenever set_up succeeded for an offload variant.
        let dev = match self.dev.as_mut() {
            Some(dev) => dev,
            None => return,
        };

        // Phase 1: one work-item per tmp element.
        {
            let (a, b) = (dev.a.as_slice(), dev.b.as_slice());
            let work_item = move |ii: usize, t: &mut Real| {
                let (i, j) = (ii / nj, ii % nj);
                *t = tmp_element(a, b, i, j, nj, nk);
            };
            match vid {
                VariantId::DevGrid => {
                    device::launch(dev.tmp.as_mut_slice(), DEVICE_BLOCK_SIZE, work_item)
                }
                VariantId::DevLaunch => device::Launch::over(n_tmp)
                    .run(dev.tmp.as_mut_slice(), work_item),
                _ => unreachable!(),
            }
        }

        // Phase 1's launch has returned; every work-item finished writing tmp
        // before phase 2 reads it.
        {
            let (tmp, c) = (dev.tmp.as_slice(), dev.c.as_slice());
            let work_item = move |ii: usize, v: &mut Real| {
                let (i, l) = (ii / nl, ii % nl);
                *v = d_element(*v, tmp, c, i, l, nj, nl);
            };
            match vid {
                VariantId::DevGrid => {
                    device::launch(dev.d.as_mut_slice(), DEVICE_BLOCK_SIZE, work_item)
                }
                VariantId::DevLaunch => device::Launch::over(n_d)
                    .run(dev.d.as_mut_slice(), work_item),
                _ => unreachable!(),
            }
        }
    }
}

impl Kernel for TwoMm {
    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn dimensions(&self) -> &ProblemDimensions {
        self.base.dims()
    }

    fn dimensions_mut(&mut self) -> &mut ProblemDimensions {
        self.base.dims_mut()
    }

    fn supports(&self, _vid: VariantId) -> bool {
        true
    }

    fn set_up(&mut self, vid: VariantId, space: &DeviceSpace) -> Result<(), HarnessError> {
        let (ni, nj, nk, nl) = (self.ni, self.nj, self.nk, self.nl);

        // Polybench-style formulaic init, keyed by role and index only.
        self.tmp = memory::alloc_and_init(ni * nj, |_| 0.0)?;
        self.a = memory::alloc_and_init(ni * nk, |idx| {
            let (i, j) = (idx / nk, idx % nk);
            ((i * j) % ni) as Real / ni as Real
        })?;
        self.b = memory::alloc_and_init(nk * nj, |idx| {
            let (i, j) = (idx / nj, idx % nj);
            ((i * (j + 1)) % nj) as Real / nj as Real
        })?;
        self.c = memory::alloc_and_init(nj * nl, |idx| {
            let (i, j) = (idx / nl, idx % nl);
            ((i * (j + 3)) % nl) as Real / nl as Real
        })?;
        self.d = memory::alloc_and_init(ni * nl, |idx| {
            let (i, j) = (idx / nl, idx % nl);
            ((i * (j + 2)) % nk) as Real / nk as Real
        })?;

        if vid.is_offload() {
            self.dev = Some(DeviceData {
                tmp: space.mirror_to_device(&self.tmp)?,
                a: space.mirror_to_device(&self.a)?,
                b: space.mirror_to_device(&self.b)?,
                c: space.mirror_to_device(&self.c)?,
                d: space.mirror_to_device(&self.d)?,
            });
        }
        Ok(())
    }

    fn run(&mut self, vid: VariantId) -> Result<(), HarnessError> {
        match vid {
            VariantId::SeqNaive | VariantId::SeqIter | VariantId::ParIter => self.run_host(vid),
            VariantId::DevGrid | VariantId::DevLaunch => self.run_device(vid),
        }
        Ok(())
    }

    fn sync_outputs(&mut self, vid: VariantId) -> Result<(), HarnessError> {
        if vid.is_offload() {
            if let Some(dev) = self.dev.as_ref() {
                dev.d.copy_to_host(&mut self.d)?;
            }
        }
        Ok(())
    }

    fn update_checksum(&mut self, vid: VariantId) {
        let value = calc_checksum(&self.d);
        self.base.add_to_checksum(vid, value);
    }

    fn checksum(&self, vid: VariantId) -> Option<Real> {
        self.base.checksum(vid)
    }

    fn tear_down(&mut self, _vid: VariantId) {
        self.dev = None;
        self.tmp = Vec::new();
        self.a = Vec::new();
        self.b = Vec::new();
        self.c = Vec::new();
        self.d = Vec::new();
    }

    fn flops_per_rep(&self) -> usize {
        let (ni, nj, nk, nl) = (self.ni, self.nj, self.nk, self.nl);
        3 * ni * nj * nk + ni * nl * (2 * nj + 1)
    }

    fn bytes_per_rep(&self) -> usize {
        let (ni, nj, nk, nl) = (self.ni, self.nj, self.nk, self.nl);
        (ni * nk + nk * nj + ni * nj + nj * nl + 2 * ni * nl) * size_of::<Real>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::run_variant;
    use crate::variant::VariantStatus;

    #[test]
    fn mini_dimensions_match_polybench() {
        let dims = dimensions(SizeClass::Mini);
        assert_eq!(dims.get("ni"), Some(16));
        assert_eq!(dims.get("nj"), Some(18));
        assert_eq!(dims.get("nk"), Some(22));
        assert_eq!(dims.get("nl"), Some(24));
        assert!(dims.is_valid());
    }

    #[test]
    fn set_up_is_variant_independent() {
        let space = DeviceSpace::unbounded();
        let mut kernel = TwoMm::new(SizeClass::Mini);

        kernel.set_up(VariantId::SeqNaive, &space).unwrap();
        let a = kernel.a.clone();
        let d = kernel.d.clone();
        kernel.tear_down(VariantId::SeqNaive);

        kernel.set_up(VariantId::ParIter, &space).unwrap();
        assert!(a.iter().zip(&kernel.a).all(|(x, y)| x.to_bits() == y.to_bits()));
        assert!(d.iter().zip(&kernel.d).all(|(x, y)| x.to_bits() == y.to_bits()));
        kernel.tear_down(VariantId::ParIter);
    }

    #[test]
    fn all_variants_agree_on_one_rep() {
        let space = DeviceSpace::unbounded();
        let mut kernel = TwoMm::new(SizeClass::Mini);
        kernel.dimensions_mut().run_reps = 1;
        kernel.dimensions_mut().sample_count = 1;

        let mut checksums = Vec::new();
        for vid in VariantId::ALL {
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
