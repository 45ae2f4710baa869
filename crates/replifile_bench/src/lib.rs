//! Benchmark utilities for Replifile.

/// Data and replica set helpers shared by the benches.
pub mod utils;
