//! Checksum computation and per-variant accumulation.
//!
//! The checksum is the correctness oracle of the suite: two variants of the
//! same kernel must reduce their output buffer to (tolerance-close) equal
//! scalars, or one of them computed something different. The comparison
//! itself lives in the report layer; this module only produces deterministic,
//! repeatable values.

use crate::utils::Real;
use crate::variant::VariantId;

/// Index-weighted reduction of an output buffer.
///
/// Weighting each element by its position makes the value sensitive to
/// element order while the summation itself stays sequential, so the result
/// is identical no matter which execution strategy produced the buffer.
pub fn calc_checksum(data: &[Real]) -> Real {
    data.iter()
        .zip(1..)
        .map(|(x, i)| x * i as Real)
        .sum()
}

/// Running per-variant checksum accumulators for one kernel.
///
/// Entries start absent, are created on the first `add` for a variant, and
/// accumulate monotonically across every subsequent `add`; they are never
/// reset mid-run.
#[derive(Clone, Debug, Default)]
pub struct ChecksumTable {
    totals: [Option<Real>; VariantId::COUNT],
}

impl ChecksumTable {
    pub fn add(&mut self, vid: VariantId, value: Real) {
        let slot = &mut self.totals[vid.index()];
        *slot = Some(slot.unwrap_or(0.0) + value);
    }

    pub fn get(&self, vid: VariantId) -> Option<Real> {
        self.totals[vid.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_by_position() {
        assert_eq!(calc_checksum(&[1.0, 2.0]), 5.0);
        assert_eq!(calc_checksum(&[2.0, 1.0]), 4.0);
        assert_eq!(calc_checksum(&[]), 0.0);
    }

    #[test]
    fn deterministic() {
        let data: Vec<f64> = (0..100).map(|i| (i as f64).sin()).collect();
        assert_eq!(calc_checksum(&data).to_bits(), calc_checksum(&data).to_bits());
    }

    #[test]
    fn table_accumulates_without_reset() {
        let mut table = ChecksumTable::default();
        assert_eq!(table.get(VariantId::SeqNaive), None);
        table.add(VariantId::SeqNaive, 2.5);
        table.add(VariantId::SeqNaive, 1.5);
        assert_eq!(table.get(VariantId::SeqNaive), Some(4.0));
        assert_eq!(table.get(VariantId::ParIter), None);
    }
}
