//! Device index-space drivers.
//!
//! The accelerator is modeled as a grid of lightweight work-items over a flat
//! index space, partitioned into fixed-size blocks that execute in parallel.
//! A launch returns only once every work-item has completed: that return is
//! the explicit synchronization point dependent kernel phases rely on, so a
//! phase that reads what a previous phase wrote simply issues its launch
//! after the previous one returned.

use crate::consts::DEVICE_BLOCK_SIZE;
use crate::utils::Real;

use rayon::prelude::*;

/// Number of blocks needed to cover `len` work-items.
pub fn grid_size(len: usize, block_size: usize) -> usize {
    (len + block_size - 1) / block_size
}

/// Base launch: one work-item per output element.
///
/// `work_item` receives the flat index and exclusive access to its own output
/// slot; work-items never write outside their assigned index.
pub fn launch(out: &mut [Real], block_size: usize, work_item: impl Fn(usize, &mut Real) + Sync) {
    out.par_chunks_mut(block_size)
        .enumerate()
        .for_each(|(block, slots)| {
            for (thread, slot) in slots.iter_mut().enumerate() {
                work_item(block * block_size + thread, slot);
            }
        });
}

/// Block-cooperative launch: each block's body receives the block index and
/// the whole slice of output slots the block owns, so it can stage data in
/// block-local buffers (the in-process stand-in for shared memory). The tail
/// block may be short when `block_size` does not divide the output length.
pub fn launch_blocks(
    out: &mut [Real],
    block_size: usize,
    block_body: impl Fn(usize, &mut [Real]) + Sync,
) {
    out.par_chunks_mut(block_size)
        .enumerate()
        .for_each(|(block, slots)| block_body(block, slots));
}

/// Reusable launch description: a flat index range plus a block size.
///
/// The abstraction-layer offload variant goes through this instead of sizing
/// grids by hand; the execution semantics are identical to [`launch`].
#[derive(Clone, Copy, Debug)]
pub struct Launch {
    len: usize,
    block_size: usize,
}

impl Launch {
    pub fn over(len: usize) -> Self {
        Self {
            len,
            block_size: DEVICE_BLOCK_SIZE,
        }
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn grid(&self) -> usize {
        grid_size(self.len, self.block_size)
    }

    pub fn run(&self, out: &mut [Real], work_item: impl Fn(usize, &mut Real) + Sync) {
        debug_assert_eq!(out.len(), self.len);
        launch(out, self.block_size, work_item);
    }

    /// Block-cooperative counterpart of [`Launch::run`]; semantics match
    /// [`launch_blocks`].
    pub fn run_blocks(&self, out: &mut [Real], block_body: impl Fn(usize, &mut [Real]) + Sync) {
        debug_assert_eq!(out.len(), self.len);
        launch_blocks(out, self.block_size, block_body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_ragged_lengths() {
        assert_eq!(grid_size(1, 256), 1);
        assert_eq!(grid_size(256, 256), 1);
        assert_eq!(grid_size(257, 256), 2);
    }

    #[test]
    fn every_work_item_runs_once() {
        let mut out = vec![0.0; 1000];
        launch(&mut out, 64, |ii, slot| *slot += ii as Real + 1.0);
        assert!(out.iter().zip(1..).all(|(x, i)| *x == i as Real));
    }

    #[test]
    fn launch_abstraction_matches_base_launch() {
        let mut a = vec![0.0; 500];
        let mut b = vec![0.0; 500];
        let wi = |ii: usize, slot: &mut Real| *slot = (ii % 7) as Real;
        launch(&mut a, DEVICE_BLOCK_SIZE, wi);
        Launch::over(500).run(&mut b, wi);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_block_size_reshapes_the_grid() {
        let tiled = Launch::over(34 * 34).block_size(16 * 34);
        assert_eq!(tiled.grid(), 3);

        let mut out = vec![0.0; 34 * 34];
        tiled.run_blocks(&mut out, |block, slots| {
            for slot in slots.iter_mut() {
                *slot = block as Real;
            }
        });
        assert_eq!(out[0], 0.0);
        assert_eq!(out[16 * 34], 1.0);
        // Tail block covers the last two rows only.
        assert_eq!(out[32 * 34], 2.0);
        assert_eq!(out[34 * 34 - 1], 2.0);
    }

    #[test]
    fn dependent_phases_see_completed_predecessors() {
        let mut stage = vec![0.0; 300];
        launch(&mut stage, 32, |ii, slot| *slot = ii as Real);
        let staged = stage.clone();
        let mut out = vec![0.0; 300];
        launch(&mut out, 32, |ii, slot| *slot = staged[ii] * 2.0);
        assert!(out.iter().zip(0..).all(|(x, i)| *x == (2 * i) as Real));
    }
}
