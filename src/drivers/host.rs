//! Host index-space drivers.
//!
//! Each driver walks an output buffer and hands disjoint pieces of it to a
//! caller-supplied body. The body carries the arithmetic; the driver only
//! decides how the index space is traversed, so the same body can be replayed
//! sequentially, through iterator expressions, or thread-parallel.

use crate::utils::Real;

use rayon::prelude::*;

/// Plain nested-loop walk over rows of `width` elements (deliberately
/// unidiomatic; this is the baseline).
pub fn rows_seq(out: &mut [Real], width: usize, body: impl Fn(usize, &mut [Real])) {
    for i in 0..out.len() / width {
        body(i, &mut out[i * width..(i + 1) * width]);
    }
}

/// Iterator-expression walk over rows.
pub fn rows_iter(out: &mut [Real], width: usize, body: impl Fn(usize, &mut [Real])) {
    out.chunks_exact_mut(width)
        .enumerate()
        .for_each(|(i, row)| body(i, row));
}

/// Thread-parallel walk over rows. Rows are disjoint, so each output element
/// is written by exactly one logical iteration.
pub fn rows_par(out: &mut [Real], width: usize, body: impl Fn(usize, &mut [Real]) + Sync) {
    out.par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(i, row)| body(i, row));
}

/// Plain nested-loop walk over bands of up to `band` elements. Unlike the
/// row walks, the tail band may be short, so tiled bodies can cover ragged
/// problem sizes.
pub fn bands_seq(out: &mut [Real], band: usize, body: impl Fn(usize, &mut [Real])) {
    let len = out.len();
    let mut start = 0;
    let mut i = 0;
    while start < len {
        let end = (start + band).min(len);
        body(i, &mut out[start..end]);
        start = end;
        i += 1;
    }
}

/// Iterator-expression walk over bands, tail band included.
pub fn bands_iter(out: &mut [Real], band: usize, body: impl Fn(usize, &mut [Real])) {
    out.chunks_mut(band)
        .enumerate()
        .for_each(|(i, slots)| body(i, slots));
}

/// Thread-parallel walk over bands. Bands are disjoint, so each output
/// element is written by exactly one logical iteration.
pub fn bands_par(out: &mut [Real], band: usize, body: impl Fn(usize, &mut [Real]) + Sync) {
    out.par_chunks_mut(band)
        .enumerate()
        .for_each(|(i, slots)| body(i, slots));
}

/// Plain loop over the elements of a rank-1 output.
pub fn elems_seq(out: &mut [Real], body: impl Fn(usize, &mut Real)) {
    for i in 0..out.len() {
        body(i, &mut out[i]);
    }
}

/// Iterator-expression walk over a rank-1 output.
pub fn elems_iter(out: &mut [Real], body: impl Fn(usize, &mut Real)) {
    out.iter_mut().enumerate().for_each(|(i, x)| body(i, x));
}

/// Thread-parallel walk over a rank-1 output.
pub fn elems_par(out: &mut [Real], body: impl Fn(usize, &mut Real) + Sync) {
    out.par_iter_mut().enumerate().for_each(|(i, x)| body(i, x));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(i: usize, row: &mut [Real]) {
        let len = row.len();
        for (j, x) in row.iter_mut().enumerate() {
            *x = (i * len + j) as Real;
        }
    }

    #[test]
    fn row_drivers_agree() {
        let mut a = vec![0.0; 24];
        let mut b = vec![0.0; 24];
        let mut c = vec![0.0; 24];
        rows_seq(&mut a, 6, fill);
        rows_iter(&mut b, 6, fill);
        rows_par(&mut c, 6, fill);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a[23], 23.0);
    }

    #[test]
    fn band_drivers_agree_on_ragged_lengths() {
        // 25 elements in bands of 6: four full bands plus a one-element tail.
        let body = |i: usize, slots: &mut [Real]| {
            for (j, x) in slots.iter_mut().enumerate() {
                *x = (i * 10 + j) as Real;
            }
        };
        let mut a = vec![0.0; 25];
        let mut b = vec![0.0; 25];
        let mut c = vec![0.0; 25];
        bands_seq(&mut a, 6, body);
        bands_iter(&mut b, 6, body);
        bands_par(&mut c, 6, body);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a[24], 40.0);
    }

    #[test]
    fn elem_drivers_agree() {
        let mut a = vec![0.0; 17];
        let mut b = vec![0.0; 17];
        let mut c = vec![0.0; 17];
        let body = |i: usize, x: &mut Real| *x = (i * i) as Real;
        elems_seq(&mut a, body);
        elems_iter(&mut b, body);
        elems_par(&mut c, body);
        assert_eq!(a, b);
        assert_eq!(a, c);
    }
}
