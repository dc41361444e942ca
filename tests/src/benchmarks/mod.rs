//! # Multicast Benchmarks
//!
//! Workload builders shared by the criterion benches in `benches/`.

pub mod buffer;
