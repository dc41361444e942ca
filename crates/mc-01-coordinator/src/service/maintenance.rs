use tracing::debug;

use super::core::Coordinator;

impl Coordinator {
    /// Drop buffered messages that no participant can still receive.
    ///
    /// Call from a timer task. Only messages outside the retention window at
    /// the current instant, and at the start of every replay still running,
    /// are removed.
    pub fn compact_buffer(&self) -> usize {
        let removed = self.shared.buffer.compact(self.now());
        if removed > 0 {
            debug!(removed, remaining = self.shared.buffer.len(), "Buffer compacted");
        }
        self.shared.metrics.messages_compacted(removed);
        self.shared.report_gauges();
        removed
    }
}
