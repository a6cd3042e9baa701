//! End-to-end harness scenarios: full variant lifecycles on the Mini size
//! class, cross-variant checksum agreement, skip/unsupported paths, and
//! device allocation accounting.

use vperf::drivers::{run_kernel, run_variant};
use vperf::kernels::{gemver, mat_mat_shared, two_mm, Kernel, KernelId};
use vperf::memory::DeviceSpace;
use vperf::sizes::SizeClass;
use vperf::variant::{VariantId, VariantStatus};

fn rel_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
}

fn mini_kernel(kid: KernelId, run_reps: usize) -> Box<dyn Kernel> {
    let mut kernel = kid.construct(SizeClass::Mini);
    kernel.dimensions_mut().run_reps = run_reps;
    kernel.dimensions_mut().sample_count = 1;
    kernel
}

#[test]
fn sizers_are_deterministic_and_positive() {
    for size in SizeClass::ALL {
        for dims in [
            two_mm::dimensions(size),
            gemver::dimensions(size),
            mat_mat_shared::dimensions(size),
        ] {
            assert!(dims.is_valid(), "{size}: dimensions must be positive");
            assert!(dims.iter().all(|(_, v)| v > 0));
        }
        assert_eq!(two_mm::dimensions(size), two_mm::dimensions(size));
        assert_eq!(gemver::dimensions(size), gemver::dimensions(size));
        assert_eq!(mat_mat_shared::dimensions(size), mat_mat_shared::dimensions(size));
    }
}

#[test]
fn mini_two_mm_host_pair_end_to_end() {
    // The 2MM-style scenario: ni=16, nj=18, nk=22, nl=24, two timed reps,
    // host-sequential vs host-thread-parallel.
    let space = DeviceSpace::unbounded();
    let mut kernel = mini_kernel(KernelId::TwoMm, 2);
    let dims = kernel.dimensions();
    assert_eq!(dims.get("ni"), Some(16));
    assert_eq!(dims.get("nj"), Some(18));
    assert_eq!(dims.get("nk"), Some(22));
    assert_eq!(dims.get("nl"), Some(24));

    let summary = run_kernel(
        kernel.as_mut(),
        &[VariantId::SeqNaive, VariantId::ParIter],
        &space,
    );
    assert!(summary.fatal.is_none());
    assert_eq!(summary.outcomes.len(), 2);

    let mut checksums = Vec::new();
    for outcome in &summary.outcomes {
        assert_eq!(outcome.status, VariantStatus::Ran);
        let timing = outcome.timing.as_ref().unwrap();
        assert!(timing.total() >= 0.0);
        assert!(!timing.is_empty());
        checksums.push(outcome.checksum.unwrap());
    }
    assert!(rel_close(checksums[0], checksums[1], 1e-9));
}

#[test]
fn all_variants_agree_for_every_kernel() {
    let space = DeviceSpace::unbounded();
    for kid in KernelId::ALL {
        let mut kernel = mini_kernel(kid, 2);
        let summary = run_kernel(kernel.as_mut(), &VariantId::ALL, &space);
        assert!(summary.fatal.is_none());

        let ran: Vec<f64> = summary
            .outcomes
            .iter()
            .filter(|o| o.status == VariantStatus::Ran)
            .map(|o| o.checksum.unwrap())
            .collect();
        assert!(ran.len() >= 4, "{kid}: expected at least four ran variants");
        for pair in ran.windows(2) {
            assert!(
                rel_close(pair[0], pair[1], 1e-9),
                "{kid}: checksum divergence {} vs {}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn unsupported_variant_leaves_checksum_table_unchanged() {
    let space = DeviceSpace::unbounded();
    let mut kernel = mini_kernel(KernelId::Gemver, 1);
    let summary = run_kernel(
        kernel.as_mut(),
        &[VariantId::SeqNaive, VariantId::DevLaunch],
        &space,
    );
    assert!(summary.fatal.is_none());
    assert_eq!(summary.outcomes[0].status, VariantStatus::Ran);
    assert_eq!(summary.outcomes[1].status, VariantStatus::Unsupported);
    assert_eq!(summary.outcomes[1].checksum, None);
    assert_eq!(kernel.checksum(VariantId::DevLaunch), None);
}

#[test]
fn exhausted_device_space_skips_offload_variant_only() {
    // Too small for the Mini 2MM mirrors, plenty for nothing.
    let space = DeviceSpace::with_capacity(10);
    let mut kernel = mini_kernel(KernelId::TwoMm, 1);
    let summary = run_kernel(
        kernel.as_mut(),
        &[VariantId::SeqNaive, VariantId::DevGrid, VariantId::ParIter],
        &space,
    );
    assert!(summary.fatal.is_none());
    assert_eq!(summary.outcomes[0].status, VariantStatus::Ran);
    assert_eq!(summary.outcomes[1].status, VariantStatus::Skipped);
    assert_eq!(summary.outcomes[2].status, VariantStatus::Ran);

    // Partially acquired mirrors were all returned.
    assert_eq!(space.live_allocations(), 0);
    assert_eq!(space.used_elements(), 0);

    // The failed offload left the host variants' checksums in agreement.
    let seq = summary.outcomes[0].checksum.unwrap();
    let par = summary.outcomes[2].checksum.unwrap();
    assert!(rel_close(seq, par, 1e-9));
    assert_eq!(kernel.checksum(VariantId::DevGrid), None);
}

#[test]
fn offload_variant_releases_all_device_allocations() {
    let space = DeviceSpace::unbounded();
    let mut kernel = mini_kernel(KernelId::TwoMm, 1);
    let before = space.live_allocations();
    let outcome = run_variant(kernel.as_mut(), VariantId::DevGrid, &space).unwrap();
    assert_eq!(outcome.status, VariantStatus::Ran);
    assert_eq!(space.live_allocations(), before);
    assert_eq!(space.used_elements(), 0);
}

#[test]
fn timing_grows_with_repetition_count() {
    let space = DeviceSpace::unbounded();

    let mut short = mini_kernel(KernelId::TwoMm, 1);
    let short_total = run_variant(short.as_mut(), VariantId::SeqNaive, &space)
        .unwrap()
        .timing
        .unwrap()
        .total();

    let mut long = mini_kernel(KernelId::TwoMm, 500);
    let long_total = run_variant(long.as_mut(), VariantId::SeqNaive, &space)
        .unwrap()
        .timing
        .unwrap()
        .total();

    assert!(short_total >= 0.0);
    assert!(long_total >= short_total);
}

#[test]
fn checksums_accumulate_across_repeated_runs_of_one_variant() {
    // The per-variant accumulator is monotone: running the same variant again
    // adds to it rather than resetting it.
    let space = DeviceSpace::unbounded();
    let mut kernel = mini_kernel(KernelId::TwoMm, 1);

    run_variant(kernel.as_mut(), VariantId::SeqNaive, &space).unwrap();
    let first = kernel.checksum(VariantId::SeqNaive).unwrap();
    run_variant(kernel.as_mut(), VariantId::SeqNaive, &space).unwrap();
    let second = kernel.checksum(VariantId::SeqNaive).unwrap();
    assert!(rel_close(second, 2.0 * first, 1e-9));
}
