//! Core Domain Entities
//!
//! - `Participant`: one registered client and its delivery watermark
//! - `Message`: one published item, immutable once appended

use std::fmt;

use shared_types::{DeliveryLine, ParticipantAddr, ParticipantId};

use super::value_objects::{MessageStamp, Timestamp};

/// Connectivity state of a registered participant.
///
/// A deregistered participant is not represented; it is simply absent from
/// the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantStatus {
    Online,
    Offline,
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    /// Inbound listener used for delivery.
    pub address: ParticipantAddr,
    pub status: ParticipantStatus,
    /// Stamp of the newest message successfully delivered. Never decreases.
    pub delivery_watermark: MessageStamp,
    /// Registration lifetime. Kept across re-registration, replaced after a
    /// deregister so stale deliveries for the old lifetime can be told apart.
    pub incarnation: u64,
    /// Online period within the incarnation. Bumped on every transition
    /// between online and offline, so a delivery queued before a drop can
    /// be told apart from one queued after the reconnect that followed.
    pub epoch: u64,
    pub registered_at: Timestamp,
    /// When the participant last went offline, if it is offline.
    pub offline_since: Option<Timestamp>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        address: ParticipantAddr,
        incarnation: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            address,
            status: ParticipantStatus::Online,
            delivery_watermark: MessageStamp::ORIGIN,
            incarnation,
            epoch: 0,
            registered_at: now,
            offline_since: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == ParticipantStatus::Online
    }

    /// Mark online. Starts a new online period if it was offline.
    pub(crate) fn go_online(&mut self) {
        if !self.is_online() {
            self.epoch += 1;
        }
        self.status = ParticipantStatus::Online;
        self.offline_since = None;
    }

    /// Mark offline. Ends the current online period if it was online.
    pub(crate) fn go_offline(&mut self, now: Timestamp) {
        if self.is_online() {
            self.epoch += 1;
            self.offline_since = Some(now);
        }
        self.status = ParticipantStatus::Offline;
    }

    /// Whether `stamp` is newer than anything already delivered.
    pub fn awaits(&self, stamp: MessageStamp) -> bool {
        stamp > self.delivery_watermark
    }
}

/// A published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Strictly increasing, starting at 1.
    pub seq: u64,
    /// Publisher. Not required to be registered.
    pub sender_id: ParticipantId,
    pub body: String,
    /// Coordinator ingestion time.
    pub timestamp: Timestamp,
}

impl Message {
    pub fn stamp(&self) -> MessageStamp {
        MessageStamp::new(self.timestamp, self.seq)
    }

    /// The line written to a recipient's listener.
    pub fn delivery_line(&self) -> DeliveryLine {
        DeliveryLine::new(self.sender_id.clone(), self.body.clone())
    }
}

/// Result of registering an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First registration of this id (or first since its deregistration).
    New,
    /// Known id re-registered; watermark preserved.
    Renewed { previous_status: ParticipantStatus },
}
