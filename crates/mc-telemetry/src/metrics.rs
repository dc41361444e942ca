//! Prometheus metrics for the coordinator.
//!
//! All metrics follow the naming convention: `mc_coordinator_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., messages_published_total)
//! - **Gauge**: Value that can go up or down (e.g., participants_online)
//! - **Histogram**: Distribution of values (e.g., delivery_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PUBLISH / DELIVERY
    // =========================================================================

    /// Messages appended to the buffer
    pub static ref MESSAGES_PUBLISHED: Counter = Counter::new(
        "mc_coordinator_messages_published_total",
        "Total number of messages accepted for fan-out"
    ).expect("metric creation failed");

    /// Delivery attempts by outcome
    pub static ref DELIVERIES: CounterVec = CounterVec::new(
        Opts::new("mc_coordinator_deliveries_total", "Delivery attempts to participants"),
        &["outcome"]  // outcome: delivered/failed/skipped
    ).expect("metric creation failed");

    /// Time spent on one delivery connection
    pub static ref DELIVERY_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "mc_coordinator_delivery_duration_seconds",
            "Time spent connecting to and writing to a participant"
        ).buckets(
            exponential_buckets(0.0005, 2.0, 14)
                .unwrap_or_else(|_| prometheus::DEFAULT_BUCKETS.to_vec())
        )
    ).expect("metric creation failed");

    // =========================================================================
    // REPLAY / RETENTION
    // =========================================================================

    /// Replays run, by result
    pub static ref REPLAYS: CounterVec = CounterVec::new(
        Opts::new("mc_coordinator_replays_total", "Replays run on reconnect"),
        &["result"]  // result: completed/failed/interrupted
    ).expect("metric creation failed");

    /// Messages a replay skipped because they left the retention window
    pub static ref MESSAGES_EXPIRED: Counter = Counter::new(
        "mc_coordinator_messages_expired_total",
        "Messages owed to a participant that aged out before replay"
    ).expect("metric creation failed");

    /// Messages removed from the buffer by compaction
    pub static ref MESSAGES_COMPACTED: Counter = Counter::new(
        "mc_coordinator_messages_compacted_total",
        "Messages dropped from the buffer by compaction"
    ).expect("metric creation failed");

    // =========================================================================
    // STATE
    // =========================================================================

    /// Participants currently online
    pub static ref PARTICIPANTS_ONLINE: Gauge = Gauge::new(
        "mc_coordinator_participants_online",
        "Number of registered participants with status online"
    ).expect("metric creation failed");

    /// Messages currently held in the buffer
    pub static ref BUFFERED_MESSAGES: Gauge = Gauge::new(
        "mc_coordinator_buffered_messages",
        "Number of messages held in the buffer"
    ).expect("metric creation failed");

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Commands received on the listener
    pub static ref COMMANDS: CounterVec = CounterVec::new(
        Opts::new("mc_coordinator_commands_total", "Protocol commands received"),
        &["command"]  // command: register/deregister/disconnect/reconnect/msend/malformed
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling it again is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Publish / delivery
        Box::new(MESSAGES_PUBLISHED.clone()),
        Box::new(DELIVERIES.clone()),
        Box::new(DELIVERY_DURATION.clone()),
        // Replay / retention
        Box::new(REPLAYS.clone()),
        Box::new(MESSAGES_EXPIRED.clone()),
        Box::new(MESSAGES_COMPACTED.clone()),
        // State
        Box::new(PARTICIPANTS_ONLINE.clone()),
        Box::new(BUFFERED_MESSAGES.clone()),
        // Commands
        Box::new(COMMANDS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
