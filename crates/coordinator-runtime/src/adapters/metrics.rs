use std::time::Duration;

use mc_01_coordinator::{CoordinatorMetrics, ReplayReport};
use mc_telemetry::{
    BUFFERED_MESSAGES, COMMANDS, DELIVERIES, DELIVERY_DURATION, MESSAGES_COMPACTED,
    MESSAGES_EXPIRED, MESSAGES_PUBLISHED, PARTICIPANTS_ONLINE, REPLAYS,
};

/// Forwards coordinator observations to the Prometheus registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl CoordinatorMetrics for PrometheusMetrics {
    fn message_published(&self) {
        MESSAGES_PUBLISHED.inc();
    }

    fn delivery(&self, outcome: &'static str, elapsed: Duration) {
        DELIVERIES.with_label_values(&[outcome]).inc();
        DELIVERY_DURATION.observe(elapsed.as_secs_f64());
    }

    fn replay_finished(&self, report: &ReplayReport) {
        let result = if report.failure.is_some() {
            "failed"
        } else if report.interrupted {
            "interrupted"
        } else {
            "completed"
        };
        REPLAYS.with_label_values(&[result]).inc();
        MESSAGES_EXPIRED.inc_by(report.expired as f64);
    }

    fn messages_compacted(&self, count: usize) {
        MESSAGES_COMPACTED.inc_by(count as f64);
    }

    fn participants_online(&self, count: usize) {
        PARTICIPANTS_ONLINE.set(count as f64);
    }

    fn buffered_messages(&self, count: usize) {
        BUFFERED_MESSAGES.set(count as f64);
    }

    fn command_received(&self, verb: &'static str) {
        COMMANDS.with_label_values(&[verb]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_result_labels() {
        let metrics = PrometheusMetrics::new();
        let before = REPLAYS.with_label_values(&["interrupted"]).get();

        metrics.replay_finished(&ReplayReport {
            interrupted: true,
            expired: 2,
            ..ReplayReport::default()
        });

        assert_eq!(REPLAYS.with_label_values(&["interrupted"]).get(), before + 1.0);
        assert!(MESSAGES_EXPIRED.get() >= 2.0);
    }

    #[test]
    fn test_commands_counted_per_verb() {
        let metrics = PrometheusMetrics::new();
        metrics.command_received("malformed");
        metrics.command_received("malformed");
        assert!(COMMANDS.with_label_values(&["malformed"]).get() >= 2.0);
    }
}
