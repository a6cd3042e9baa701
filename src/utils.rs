//! Utility types shared by the kernels and drivers.

use rand::prelude::*;

use std::ops::{AddAssign, MulAssign};

/// Precision every shipped kernel benchmarks in.
pub type Real = f64;

/// Utility trait that generalizes floating-point types in the harness.
///
/// Provides the seeded, reproducible buffer fill the data manager relies on:
/// the same seed always produces the same bits, independent of which variant
/// is about to run.
pub trait BenchFloat:
    num::Float + Default + AddAssign + MulAssign + Send + Sync + 'static
{
    /// Produces `n` values in the range `[0.0, 1.0)` from a seeded generator.
    fn seeded_fill(n: usize, seed: u64) -> Vec<Self>;
}

impl BenchFloat for f32 {
    fn seeded_fill(n: usize, seed: u64) -> Vec<Self> {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        let between = rand::distributions::Uniform::new(0.0_f32, 1.0_f32);
        (0..n).map(|_| between.sample(&mut rng)).collect()
    }
}

impl BenchFloat for f64 {
    fn seeded_fill(n: usize, seed: u64) -> Vec<Self> {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        let between = rand::distributions::Uniform::new(0.0_f64, 1.0_f64);
        (0..n).map(|_| between.sample(&mut rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_fill_is_reproducible() {
        let a = f64::seeded_fill(64, 7);
        let b = f64::seeded_fill(64, 7);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn seeds_differ() {
        let a = f64::seeded_fill(64, 1);
        let b = f64::seeded_fill(64, 2);
        assert_ne!(a, b);
    }
}
