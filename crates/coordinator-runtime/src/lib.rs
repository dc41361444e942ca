//! # Coordinator Runtime Library
//!
//! Configuration, metrics wiring and process lifecycle for the coordinator
//! binary. The main entry point is `main.rs`.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod runtime;

pub use container::{ConfigError, NodeConfig};
pub use runtime::CoordinatorRuntime;
