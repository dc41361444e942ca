//! # Participant Directory
//!
//! Concurrency-safe map from participant identity to address, status and
//! delivery watermark.
//!
//! Every lookup-then-mutate happens under a single write lock, so each
//! operation is atomic per key. Readers get copies; [`online_snapshot`]
//! can be iterated while the directory keeps changing.
//!
//! [`online_snapshot`]: ParticipantDirectory::online_snapshot

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use shared_types::{ParticipantAddr, ParticipantId};

use super::entities::{Participant, ParticipantStatus, Registration};
use super::value_objects::{MessageStamp, Timestamp};

/// Participant directory.
#[derive(Debug)]
pub struct ParticipantDirectory {
    entries: RwLock<HashMap<ParticipantId, Participant>>,
    next_incarnation: AtomicU64,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_incarnation: AtomicU64::new(1),
        }
    }

    /// Create or overwrite an entry, status online.
    ///
    /// A known id keeps its delivery watermark and incarnation; only the
    /// address and status are replaced.
    pub fn register(
        &self,
        id: ParticipantId,
        address: ParticipantAddr,
        now: Timestamp,
    ) -> (Participant, Registration) {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get_mut(&id) {
            let previous_status = existing.status;
            existing.address = address;
            existing.go_online();
            return (existing.clone(), Registration::Renewed { previous_status });
        }

        let incarnation = self.next_incarnation.fetch_add(1, Ordering::Relaxed);
        let participant = Participant::new(id.clone(), address, incarnation, now);
        entries.insert(id, participant.clone());
        (participant, Registration::New)
    }

    pub fn lookup(&self, id: &ParticipantId) -> Option<Participant> {
        self.entries.read().get(id).cloned()
    }

    /// Set the status, returning the previous one. No-op if absent.
    pub fn set_status(
        &self,
        id: &ParticipantId,
        status: ParticipantStatus,
        now: Timestamp,
    ) -> Option<ParticipantStatus> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(id)?;
        let previous = entry.status;
        match status {
            ParticipantStatus::Online => entry.go_online(),
            ParticipantStatus::Offline => entry.go_offline(now),
        }
        Some(previous)
    }

    /// Replace the address. Returns false if absent.
    pub fn update_address(&self, id: &ParticipantId, address: ParticipantAddr) -> bool {
        match self.entries.write().get_mut(id) {
            Some(entry) => {
                entry.address = address;
                true
            }
            None => false,
        }
    }

    /// Bring a participant back online at a new port (and host, when given)
    /// in one atomic step. Returns the updated entry, or `None` if absent.
    pub fn reconnect(
        &self,
        id: &ParticipantId,
        host: Option<String>,
        port: u16,
    ) -> Option<Participant> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(id)?;
        entry.address = match host {
            Some(host) => ParticipantAddr::new(host, port),
            None => entry.address.with_port(port),
        };
        entry.go_online();
        Some(entry.clone())
    }

    pub fn remove(&self, id: &ParticipantId) -> Option<Participant> {
        self.entries.write().remove(id)
    }

    /// Point-in-time copy of every online participant.
    pub fn online_snapshot(&self) -> Vec<Participant> {
        self.entries
            .read()
            .values()
            .filter(|p| p.is_online())
            .cloned()
            .collect()
    }

    /// Raise the watermark of one registration lifetime to at least `stamp`.
    ///
    /// Returns the resulting watermark, or `None` when the id is absent or
    /// belongs to a different incarnation.
    pub fn advance_watermark(
        &self,
        id: &ParticipantId,
        incarnation: u64,
        stamp: MessageStamp,
    ) -> Option<MessageStamp> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(id)
            .filter(|entry| entry.incarnation == incarnation)?;
        entry.delivery_watermark = entry.delivery_watermark.max(stamp);
        Some(entry.delivery_watermark)
    }

    /// Flip an online participant offline after a failed delivery.
    ///
    /// Only the online period the delivery was attempted in is ended; a
    /// participant that has since dropped and come back stays online.
    /// Returns true if this call made the transition.
    pub fn mark_offline(
        &self,
        id: &ParticipantId,
        incarnation: u64,
        epoch: u64,
        now: Timestamp,
    ) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(id) {
            Some(entry)
                if entry.incarnation == incarnation && entry.epoch == epoch && entry.is_online() =>
            {
                entry.go_offline(now);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.entries.read().values().filter(|p| p.is_online()).count()
    }
}

impl Default for ParticipantDirectory {
    fn default() -> Self {
        Self::new()
    }
}
