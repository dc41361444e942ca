//! # Multicast Telemetry
//!
//! Logging and metrics shared by the coordinator and participant binaries.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events through a `tracing-subscriber` registry,
//!   pretty or JSON
//! - **Metrics**: Prometheus counters and gauges in a crate-local registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::for_service("coordinator"))?;
//!     // Your application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `multicast-coordinator` | Service name in logs |
//! | `MC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `MC_JSON_LOGS` | `false` | JSON formatted logs |
//! | `MC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, BUFFERED_MESSAGES, COMMANDS, DELIVERIES, DELIVERY_DURATION,
    MESSAGES_COMPACTED, MESSAGES_EXPIRED, MESSAGES_PUBLISHED, PARTICIPANTS_ONLINE, REGISTRY,
    REPLAYS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the log subscriber.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first (synchronous, no global subscriber needed)
    register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TelemetryError::Config("bad".into());
        assert_eq!(err.to_string(), "Invalid configuration: bad");
    }
}
