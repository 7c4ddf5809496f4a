// THEORY:
// This file is the main entry point for the `colony_radial` library crate.
// It exposes the radial motion engine to external consumers (like the
// `radial_runner` orchestrator), which hand it already-normalized spot and
// edge tables keyed by `File_ID`.
//
// The public surface is deliberately small: `RadialPipeline` for the
// sequential batch, `ParallelRadialPipeline` for the worker-pool batch, and
// the data structures they consume and produce. The numerical internals live
// in `core_modules` and never touch the filesystem or the environment.

pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod parallel_pipeline;

pub use error::RadialError;
pub use parallel_pipeline::{CancelHandle, ParallelRadialPipeline};
pub use pipeline::{RadialConfig, RadialPipeline};
