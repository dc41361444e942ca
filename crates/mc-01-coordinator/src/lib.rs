//! # Multicast Coordinator
//!
//! Participant directory, time-windowed message buffer and the fan-out /
//! replay engine of a small publish/subscribe broker.
//!
//! Participants register a listener address, publish short text messages to
//! every online peer, and may disconnect and reconnect later. On reconnect
//! they receive, in order and exactly once, everything published while they
//! were away, as long as it is still inside the retention window.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** directory, buffer, stamps, retention predicate
//! - **Ports Layer:** `CoordinatorApi` (driving), `DeliveryTransport`,
//!   `TimeSource`, `ConfigProvider`, `CoordinatorMetrics` (driven)
//! - **Service Layer:** session transitions, fan-out and replay over
//!   per-participant delivery lanes
//! - **Adapters Layer:** system clock, TCP delivery, TCP command listener
//!   (feature-gated)
//!
//! ## Example
//!
//! ```rust,ignore
//! use mc_01_coordinator::{
//!     Coordinator, CoordinatorApi, DeliveryConfig, RetentionConfig, SystemTimeSource,
//!     TcpDeliveryTransport,
//! };
//!
//! let coordinator = Coordinator::new(
//!     RetentionConfig::from_secs(60),
//!     Arc::new(TcpDeliveryTransport::new(DeliveryConfig::default())),
//!     Box::new(SystemTimeSource::new()),
//! );
//!
//! coordinator.register(alice, ParticipantAddr::new("127.0.0.1", 7001)).await?;
//! let report = coordinator.publish(alice, "hello".into()).await?;
//! assert_eq!(report.delivered.len(), 1);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// ADAPTERS
// =============================================================================

/// System clock, static config, delivery transports and the command
/// listener. TCP pieces require feature: `network`
pub mod adapters;

/// Test utilities (ControllableTimeSource, RecordingTransport, etc.)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// CORE RE-EXPORTS (Always Available)
// =============================================================================

// Domain
pub use domain::{
    CommandOutcome, CoordinatorError, CoordinatorStats, DeliveryConfig, DeliveryError,
    DeliveryOutcome, EligibleMessages, FanoutReport, Message, MessageBuffer, MessageStamp,
    Participant, ParticipantDirectory, ParticipantStatus, Registration, ReplayReport,
    RetentionConfig, SkipReason, Timestamp,
};

// Port traits
pub use ports::{
    ConfigProvider, CoordinatorApi, CoordinatorMetrics, DeliveryTransport, NoOpMetrics,
    TimeSource,
};

// Service
pub use service::Coordinator;

// Protocol types used across the API
pub use shared_types::{Command, DeliveryLine, ParticipantAddr, ParticipantId, ProtocolError};

// =============================================================================
// ADAPTER RE-EXPORTS
// =============================================================================

pub use adapters::{NoOpDeliveryTransport, StaticConfigProvider, SystemTimeSource};

#[cfg(feature = "network")]
pub use adapters::{CommandListener, ListenerConfig, TcpDeliveryTransport};

// =============================================================================
// TEST UTILITIES (Requires `test-utils` feature)
// =============================================================================

#[cfg(feature = "test-utils")]
pub use test_utils::{ControllableTimeSource, FixedTimeSource, RecordingTransport};
