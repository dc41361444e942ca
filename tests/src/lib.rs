//! # Multicast Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Buffer scan workloads shared with criterion
//! │   └── buffer.rs
//! │
//! └── integration/
//!     ├── flows.rs      # Coordinator + participants over loopback TCP
//!     └── lifecycle.rs  # Randomized command sequences vs. a reference model
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p mc-tests
//!
//! # By category
//! cargo test -p mc-tests integration::flows
//! cargo test -p mc-tests integration::lifecycle
//!
//! # Benchmarks
//! cargo bench -p mc-tests
//! ```

pub mod benchmarks;
pub mod integration;
