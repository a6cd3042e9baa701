//! VPERF - Kernel-Variant Performance Suite
//!
//! # About
//! VPERF is a benchmarking harness that replays the same numerical kernel
//! under several independent execution strategies and cross-validates that
//! they all compute the same thing. Each kernel's arithmetic is written once,
//! as a set of per-element body functions; variants differ only in the
//! index-space driver that dispatches the body:
//! - plain nested host loops (baseline),
//! - iterator-expression host loops,
//! - thread-parallel host loops (via [`rayon`][1]),
//! - offload to a capacity-tracked device memory space, with an explicit
//!   grid or through a reusable launch abstraction.
//!
//! Every variant's output buffer is reduced to a deterministic checksum;
//! agreement between variants (within a relative tolerance) is the suite's
//! correctness oracle, since independently scheduled executions of the same
//! math must not diverge.
//!
//! Currently VPERF ships three kernels:
//! - 2MM (polybench; double dense matrix multiplication, two dependent
//!   phases)
//! - GEMVER (polybench; rank-2 matrix update plus matvec chain, four
//!   dependent phases)
//! - MAT_MAT_SHARED (tiled square matrix multiply with block-local tile
//!   staging)
//!
//! # Quickstart
//! ```sh
//! cargo run --release -- --size-class small
//! ```
//! Restrict the run to one kernel and a subset of strategies:
//! ```sh
//! cargo run --release -- --kernels two-mm --variants seq-naive par-iter
//! ```
//! Results are emitted as CSV (one row per kernel/variant pair) to `stdout`
//! or to `--output-file`; set `RUST_LOG=vperf=debug` to watch the variant
//! lifecycle.
//!
//! [1]: https://crates.io/crates/rayon

pub mod checksum;
pub mod cli;
pub mod consts;
pub mod drivers;
pub mod error;
pub mod kernels;
pub mod memory;
pub mod report;
pub mod sizes;
pub mod timer;
pub mod utils;
pub mod variant;
