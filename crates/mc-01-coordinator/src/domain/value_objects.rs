//! Value Objects for the Coordinator
//!
//! Timestamps are milliseconds since the Unix epoch. A message's position in
//! the buffer is its [`MessageStamp`]; delivery watermarks are stamps too.

use std::fmt;
use std::time::Duration;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself, lower than any real clock reading.
    pub const EPOCH: Self = Self(0);

    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[must_use]
    pub fn add_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    #[must_use]
    pub fn sub_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Position of a message in the buffer.
///
/// Ordered by timestamp first, then by the coordinator-assigned sequence
/// number, so messages ingested within the same millisecond stay distinct.
/// Since timestamps never decrease in insertion order, stamp order equals
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageStamp {
    pub timestamp: Timestamp,
    pub seq: u64,
}

impl MessageStamp {
    /// Baseline watermark of a fresh participant. Every message stamp is
    /// strictly greater because sequence numbers start at 1.
    pub const ORIGIN: Self = Self {
        timestamp: Timestamp::EPOCH,
        seq: 0,
    };

    pub fn new(timestamp: Timestamp, seq: u64) -> Self {
        Self { timestamp, seq }
    }
}

impl Default for MessageStamp {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for MessageStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.timestamp, self.seq)
    }
}

/// Retention window (`persistenceTime`).
///
/// A message stamped at `ts` is inside the window at `now` iff
/// `now - ts <= persistence_time`. The boundary is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    pub persistence_time_ms: u64,
}

impl RetentionConfig {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            persistence_time_ms: secs.saturating_mul(1_000),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self {
            persistence_time_ms: millis,
        }
    }

    pub fn persistence_time(&self) -> Duration {
        Duration::from_millis(self.persistence_time_ms)
    }

    /// Whether a message stamped at `timestamp` is still retained at `now`.
    pub fn is_within(&self, timestamp: Timestamp, now: Timestamp) -> bool {
        now.millis_since(timestamp) <= self.persistence_time_ms
    }

    /// A short window for tests.
    pub fn for_testing() -> Self {
        Self::from_secs(5)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::from_secs(60)
    }
}

/// Timeouts applied to every outbound delivery connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Bound on establishing the TCP connection.
    pub connect_timeout_ms: u64,
    /// Bound on writing the delivery line and closing.
    pub write_timeout_ms: u64,
}

impl DeliveryConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn for_testing() -> Self {
        Self {
            connect_timeout_ms: 250,
            write_timeout_ms: 250,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2_000,
            write_timeout_ms: 2_000,
        }
    }
}
