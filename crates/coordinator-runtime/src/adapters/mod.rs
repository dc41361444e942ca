//! # Adapter Implementations
//!
//! Runtime-side implementations of the coordinator's outbound ports.
//!
//! ```text
//!   Coordinator ──CoordinatorMetrics──→ PrometheusMetrics ──→ mc-telemetry REGISTRY
//! ```

pub mod metrics;

pub use metrics::PrometheusMetrics;
