//! Crate-level constants.

/// Default number of outer timing samples taken per (kernel, variant) pair.
pub const DEFAULT_SAMPLE_COUNT: usize = 3;

/// Number of work-items per block in the device grid.
pub const DEVICE_BLOCK_SIZE: usize = 256;

/// Edge length of the square tiles staged by block-cooperative kernels.
pub const DEVICE_TILE_DIM: usize = 16;

/// Default capacity of the device memory space, in elements.
pub const DEVICE_CAPACITY: usize = 1 << 28;

/// Default relative tolerance for cross-variant checksum agreement.
pub const CHECKSUM_REL_TOL: f64 = 1e-9;
