//! # Message Buffer Workloads
//!
//! Replay cost is dominated by the scan in `eligible_since`. These helpers
//! build buffers where most messages are expired, most are already
//! delivered, or everything is owed.

use std::sync::Arc;

use mc_01_coordinator::{MessageBuffer, MessageStamp, RetentionConfig, Timestamp};
use shared_types::ParticipantId;

/// Buffer of `count` messages, one per millisecond starting at 0.
pub fn filled_buffer(count: u64, window_ms: u64) -> Arc<MessageBuffer> {
    let buffer = Arc::new(MessageBuffer::new(RetentionConfig::from_millis(window_ms)));
    let sender = ParticipantId::new("bench").expect("static id is valid");
    for i in 0..count {
        buffer.append(sender.clone(), format!("message {i}"), Timestamp::new(i));
    }
    buffer
}

/// Number of messages a participant at `watermark` is owed at `now`.
pub fn owed(buffer: &Arc<MessageBuffer>, watermark: MessageStamp, now: Timestamp) -> usize {
    buffer.eligible_since(watermark, now).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owed_counts_window_and_watermark() {
        let buffer = filled_buffer(1_000, 100);

        // Window covers timestamps 899..=999.
        assert_eq!(owed(&buffer, MessageStamp::ORIGIN, Timestamp::new(999)), 101);

        let watermark = MessageStamp::new(Timestamp::new(949), 950);
        assert_eq!(owed(&buffer, watermark, Timestamp::new(999)), 50);
    }
}
