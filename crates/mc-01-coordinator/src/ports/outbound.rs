//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the coordinator **requires** from its host.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::{DeliveryLine, ParticipantAddr};

use crate::domain::{DeliveryConfig, ReplayReport, RetentionConfig, Timestamp};

pub use crate::domain::DeliveryError;

/// "Send line to address".
///
/// One call is one delivery: open a short-lived connection to `addr`, write
/// `line`, close. Implementations must bound the whole attempt with
/// timeouts; the engine treats any error as the recipient being unreachable.
///
/// # Thread Safety
///
/// Shared by every delivery lane, so it must be `Send + Sync`.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn deliver(&self, addr: &ParticipantAddr, line: &DeliveryLine)
        -> Result<(), DeliveryError>;
}

/// Source of ingestion timestamps (milliseconds since the Unix epoch).
///
/// Enables deterministic testing by injecting controllable time sources.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Abstract interface for configuration loading.
pub trait ConfigProvider: Send + Sync {
    /// Retention window for the message buffer.
    fn retention_config(&self) -> RetentionConfig;

    /// Timeouts for outbound deliveries.
    fn delivery_config(&self) -> DeliveryConfig;
}

/// Observability hooks.
///
/// All methods default to doing nothing; the runtime forwards them to its
/// metrics registry.
pub trait CoordinatorMetrics: Send + Sync {
    fn message_published(&self) {}

    /// `outcome` is one of `delivered`, `failed`, `skipped`.
    fn delivery(&self, _outcome: &'static str, _elapsed: Duration) {}

    fn replay_finished(&self, _report: &ReplayReport) {}

    fn messages_compacted(&self, _count: usize) {}

    fn participants_online(&self, _count: usize) {}

    fn buffered_messages(&self, _count: usize) {}

    /// One request line received; `verb` is `malformed` if it did not parse.
    fn command_received(&self, _verb: &'static str) {}
}

/// Metrics sink that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl CoordinatorMetrics for NoOpMetrics {}
