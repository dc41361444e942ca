//! # Message Buffer
//!
//! Append-only, time-ordered log of published messages.
//!
//! Retention is enforced on read: [`MessageBuffer::eligible_since`] filters by
//! the retention window and a watermark. Memory is bounded separately by
//! [`MessageBuffer::compact`], which only drops messages that are already
//! outside the window for every reader, including scans still in progress
//! at an earlier instant.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::ParticipantId;

use super::entities::Message;
use super::value_objects::{MessageStamp, RetentionConfig, Timestamp};

#[derive(Debug)]
struct BufferState {
    messages: VecDeque<Arc<Message>>,
    next_seq: u64,
    last_timestamp: Timestamp,
    /// Evaluation instants of live scans, with a count per instant.
    open_scans: BTreeMap<Timestamp, usize>,
}

impl BufferState {
    /// Oldest instant any reader still evaluates the window at.
    fn horizon(&self, now: Timestamp) -> Timestamp {
        self.open_scans
            .keys()
            .next()
            .map_or(now, |oldest| (*oldest).min(now))
    }
}

/// Shared message log.
#[derive(Debug)]
pub struct MessageBuffer {
    state: RwLock<BufferState>,
    retention: RetentionConfig,
}

impl MessageBuffer {
    pub fn new(retention: RetentionConfig) -> Self {
        Self {
            state: RwLock::new(BufferState {
                messages: VecDeque::new(),
                next_seq: 1,
                last_timestamp: Timestamp::EPOCH,
                open_scans: BTreeMap::new(),
            }),
            retention,
        }
    }

    pub fn retention(&self) -> RetentionConfig {
        self.retention
    }

    /// Stamp and append a message.
    ///
    /// A clock reading older than the newest message is raised to that
    /// message's timestamp, keeping timestamps non-decreasing.
    pub fn append(&self, sender_id: ParticipantId, body: String, now: Timestamp) -> Arc<Message> {
        let mut state = self.state.write();
        let timestamp = now.max(state.last_timestamp);
        let message = Arc::new(Message {
            seq: state.next_seq,
            sender_id,
            body,
            timestamp,
        });
        state.next_seq += 1;
        state.last_timestamp = timestamp;
        state.messages.push_back(Arc::clone(&message));
        message
    }

    /// Lazily scan every message newer than `watermark` that is still inside
    /// the retention window at `now`, in stamp order.
    ///
    /// The scan re-reads the buffer on each step, so calling this again
    /// always starts from the current state. Until it is dropped, compaction
    /// keeps every message still inside the window at `now`.
    pub fn eligible_since(self: &Arc<Self>, watermark: MessageStamp, now: Timestamp) -> EligibleMessages {
        *self.state.write().open_scans.entry(now).or_insert(0) += 1;
        EligibleMessages {
            buffer: Arc::clone(self),
            cursor: watermark,
            now,
            expired: 0,
        }
    }

    /// First message with a stamp strictly greater than `cursor`.
    fn first_after(&self, cursor: MessageStamp) -> Option<Arc<Message>> {
        let state = self.state.read();
        let index = state.messages.partition_point(|m| m.stamp() <= cursor);
        state.messages.get(index).cloned()
    }

    /// Drop the prefix of messages outside the retention window at `now`.
    ///
    /// A live scan started at an earlier instant holds the window back to
    /// that instant. Returns how many were removed.
    pub fn compact(&self, now: Timestamp) -> usize {
        let mut state = self.state.write();
        let horizon = state.horizon(now);
        let mut removed = 0;
        while let Some(front) = state.messages.front() {
            if self.retention.is_within(front.timestamp, horizon) {
                break;
            }
            state.messages.pop_front();
            removed += 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.state.read().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().messages.is_empty()
    }

    /// Stamp of the most recently appended message still buffered.
    pub fn newest_stamp(&self) -> Option<MessageStamp> {
        self.state.read().messages.back().map(|m| m.stamp())
    }
}

/// Lazy, restartable eligibility scan produced by
/// [`MessageBuffer::eligible_since`].
///
/// Holds no lock between steps. A message appended during the scan may or
/// may not be observed.
#[derive(Debug)]
pub struct EligibleMessages {
    buffer: Arc<MessageBuffer>,
    cursor: MessageStamp,
    now: Timestamp,
    expired: usize,
}

impl EligibleMessages {
    /// Messages newer than the watermark that were skipped as expired.
    pub fn expired(&self) -> usize {
        self.expired
    }

    /// Time the window is evaluated at.
    pub fn now(&self) -> Timestamp {
        self.now
    }
}

impl Drop for EligibleMessages {
    fn drop(&mut self) {
        let mut state = self.buffer.state.write();
        if let Some(count) = state.open_scans.get_mut(&self.now) {
            *count -= 1;
            if *count == 0 {
                state.open_scans.remove(&self.now);
            }
        }
    }
}

impl Iterator for EligibleMessages {
    type Item = Arc<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        let retention = self.buffer.retention;
        loop {
            let message = self.buffer.first_after(self.cursor)?;
            self.cursor = message.stamp();
            if retention.is_within(message.timestamp, self.now) {
                return Some(message);
            }
            self.expired += 1;
        }
    }
}
