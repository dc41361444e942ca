//! Test utilities for the coordinator.
//!
//! Deterministic clocks and an in-memory delivery transport.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use mc_01_coordinator::test_utils::ControllableTimeSource;
//! use mc_01_coordinator::TimeSource;
//!
//! let clock = ControllableTimeSource::new(1_000);
//! clock.advance_secs(2);
//! assert_eq!(clock.now().as_millis(), 3_000);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{DeliveryLine, ParticipantAddr};

use crate::domain::{DeliveryError, Timestamp};
use crate::ports::outbound::{DeliveryTransport, TimeSource};

/// A time source that returns a fixed timestamp (milliseconds).
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: u64,
}

impl FixedTimeSource {
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.timestamp)
    }
}

/// Clock that tests move by hand.
///
/// Clones share the same reading, so a test can keep one handle and give
/// the other to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct ControllableTimeSource {
    millis: Arc<AtomicU64>,
}

impl ControllableTimeSource {
    pub fn new(initial_millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(initial_millis)),
        }
    }

    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_millis(secs * 1_000);
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.millis.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Default)]
struct Recorded {
    deliveries: Vec<(ParticipantAddr, DeliveryLine)>,
    unreachable: HashSet<ParticipantAddr>,
    attempts: usize,
}

/// In-memory transport that records every successful delivery.
///
/// Addresses marked with [`fail_address`](Self::fail_address) refuse
/// connections until healed.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_address(&self, addr: &ParticipantAddr) {
        self.inner.lock().unreachable.insert(addr.clone());
    }

    pub fn heal_address(&self, addr: &ParticipantAddr) {
        self.inner.lock().unreachable.remove(addr);
    }

    /// Every successful delivery, in the order it happened.
    pub fn deliveries(&self) -> Vec<(ParticipantAddr, DeliveryLine)> {
        self.inner.lock().deliveries.clone()
    }

    /// Bodies delivered to one address, in order.
    pub fn bodies_to(&self, addr: &ParticipantAddr) -> Vec<String> {
        self.inner
            .lock()
            .deliveries
            .iter()
            .filter(|(to, _)| to == addr)
            .map(|(_, line)| line.body.clone())
            .collect()
    }

    /// Attempts made, including refused ones.
    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts
    }

    pub fn clear(&self) {
        self.inner.lock().deliveries.clear();
    }
}

#[async_trait]
impl DeliveryTransport for RecordingTransport {
    async fn deliver(
        &self,
        addr: &ParticipantAddr,
        line: &DeliveryLine,
    ) -> Result<(), DeliveryError> {
        let mut inner = self.inner.lock();
        inner.attempts += 1;
        if inner.unreachable.contains(addr) {
            return Err(DeliveryError::ConnectionRefused { addr: addr.clone() });
        }
        inner.deliveries.push((addr.clone(), line.clone()));
        Ok(())
    }
}
