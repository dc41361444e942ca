//! Outcome reports returned by the fan-out and replay engine.

use std::sync::Arc;

use shared_types::ParticipantId;

use super::entities::{Message, Registration};
use super::errors::DeliveryError;
use super::value_objects::MessageStamp;

/// Why a queued delivery was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Participant went offline before its turn came.
    Offline,
    /// Participant was deregistered (or re-created) in the meantime.
    Deregistered,
    /// Participant dropped and came back since the job was queued; the
    /// replay queued by the reconnect owns this message now.
    Superseded,
    /// A replay already delivered this message.
    AlreadyDelivered,
    /// Message left the retention window while queued.
    Expired,
}

/// Result of one delivery attempt to one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { watermark: MessageStamp },
    Failed(DeliveryError),
    Skipped(SkipReason),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Per-recipient results of a publish.
#[derive(Debug, Clone)]
pub struct FanoutReport {
    pub message: Arc<Message>,
    pub delivered: Vec<ParticipantId>,
    pub failed: Vec<ParticipantId>,
    pub skipped: Vec<ParticipantId>,
}

impl FanoutReport {
    pub fn new(message: Arc<Message>) -> Self {
        Self {
            message,
            delivered: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn recipients(&self) -> usize {
        self.delivered.len() + self.failed.len() + self.skipped.len()
    }
}

/// Results of one replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Messages delivered, in stamp order.
    pub delivered: usize,
    /// Messages newer than the watermark that had aged out of the window.
    pub expired: usize,
    /// Failure that ended the replay early, if any.
    pub failure: Option<DeliveryError>,
    /// Replay stopped because the participant went offline or away.
    pub interrupted: bool,
}

impl ReplayReport {
    pub fn completed(&self) -> bool {
        self.failure.is_none() && !self.interrupted
    }
}

/// Result of executing one protocol command.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Registered(Registration),
    Deregistered,
    Disconnected,
    Reconnected(ReplayReport),
    Published(FanoutReport),
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub registered: usize,
    pub online: usize,
    pub buffered_messages: usize,
    pub newest_stamp: Option<MessageStamp>,
}
