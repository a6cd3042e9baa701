//! Command-Line Interface related code.
//!
//! This module handles the parsing of CLI arguments using the [`clap`][1]
//! crate. It defines the runtime options: kernel and variant selection,
//! problem size class, repetition overrides, device capacity and output
//! redirection.
//!
//! [1]: https://crates.io/crates/clap

use crate::consts;
use crate::kernels::KernelId;
use crate::sizes::SizeClass;
use crate::variant::VariantId;

use clap::Parser;

use std::path::PathBuf;

/// Cross-backend kernel-variant performance suite.
///
/// Runs the same numerical kernels under several independent execution
/// strategies (sequential, iterator-based and thread-parallel host loops,
/// plus offload to a device memory space), recording per-variant wall-clock
/// cost and cross-validating the variants' checksums against each other.
#[derive(Clone, Debug, Parser)]
pub struct CliArgs {
    /// Problem size class.
    #[arg(short, long, value_enum, default_value_t = SizeClass::Medium)]
    pub size_class: SizeClass,

    /// Kernels to run; defaults to every kernel.
    #[arg(short, long, value_enum, num_args = 1..)]
    pub kernels: Option<Vec<KernelId>>,

    /// Execution strategies to request; kernels silently report
    /// "unsupported" for strategies they do not implement.
    #[arg(short, long, value_enum, num_args = 1..)]
    pub variants: Option<Vec<VariantId>>,

    /// Override the per-size-class number of outer timing samples.
    #[arg(long, value_name = "SAMPLES")]
    pub samples: Option<usize>,

    /// Override the per-size-class number of timed repetitions.
    #[arg(long, value_name = "REPS")]
    pub reps: Option<usize>,

    /// Capacity of the device memory space, in elements.
    #[arg(long, default_value_t = consts::DEVICE_CAPACITY)]
    pub device_capacity: usize,

    /// Relative tolerance for cross-variant checksum agreement.
    #[arg(long, default_value_t = consts::CHECKSUM_REL_TOL)]
    pub tolerance: f64,

    /// Output file, defaults to `stdout` if unspecified.
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,
}
