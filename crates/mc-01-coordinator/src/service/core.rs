use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::ParticipantId;

use crate::domain::{
    CoordinatorStats, MessageBuffer, ParticipantDirectory, RetentionConfig, Timestamp,
};
use crate::ports::{ConfigProvider, CoordinatorMetrics, DeliveryTransport, NoOpMetrics, TimeSource};

use super::lane::LaneHandle;

/// State reachable from delivery lanes.
///
/// Lanes hold an `Arc<Shared>`; the lane table itself lives on
/// [`Coordinator`] so dropping the coordinator closes every lane.
pub(crate) struct Shared {
    pub(crate) directory: ParticipantDirectory,
    pub(crate) buffer: Arc<MessageBuffer>,
    pub(crate) transport: Arc<dyn DeliveryTransport>,
    pub(crate) time_source: Box<dyn TimeSource>,
    pub(crate) metrics: Arc<dyn CoordinatorMetrics>,
}

impl Shared {
    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    pub(crate) fn report_gauges(&self) {
        self.metrics
            .participants_online(self.directory.online_count());
        self.metrics.buffered_messages(self.buffer.len());
    }
}

/// Multicast coordinator implementing the driving port.
///
/// Wraps the participant directory, the message buffer and one delivery
/// lane per registered participant.
///
/// # Example
///
/// ```rust,ignore
/// use mc_01_coordinator::{Coordinator, RetentionConfig, SystemTimeSource, TcpDeliveryTransport};
///
/// let coordinator = Coordinator::new(
///     RetentionConfig::from_secs(60),
///     Arc::new(TcpDeliveryTransport::new(DeliveryConfig::default())),
///     Box::new(SystemTimeSource::new()),
/// );
/// coordinator.register(id, addr).await?;
/// ```
pub struct Coordinator {
    pub(crate) shared: Arc<Shared>,
    /// Lane per participant.
    ///
    /// Held across append + snapshot + submit in `publish`, so every lane
    /// receives its jobs in stamp order.
    pub(crate) lanes: Mutex<HashMap<ParticipantId, LaneHandle>>,
}

impl Coordinator {
    /// Create a coordinator that records no metrics.
    pub fn new(
        retention: RetentionConfig,
        transport: Arc<dyn DeliveryTransport>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        Self::with_metrics(retention, transport, time_source, Arc::new(NoOpMetrics))
    }

    pub fn with_metrics(
        retention: RetentionConfig,
        transport: Arc<dyn DeliveryTransport>,
        time_source: Box<dyn TimeSource>,
        metrics: Arc<dyn CoordinatorMetrics>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                directory: ParticipantDirectory::new(),
                buffer: Arc::new(MessageBuffer::new(retention)),
                transport,
                time_source,
                metrics,
            }),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// Create a coordinator with the retention window from `config`.
    pub fn from_config(
        config: &dyn ConfigProvider,
        transport: Arc<dyn DeliveryTransport>,
        time_source: Box<dyn TimeSource>,
        metrics: Arc<dyn CoordinatorMetrics>,
    ) -> Self {
        Self::with_metrics(config.retention_config(), transport, time_source, metrics)
    }

    pub fn retention(&self) -> RetentionConfig {
        self.shared.buffer.retention()
    }

    pub fn directory(&self) -> &ParticipantDirectory {
        &self.shared.directory
    }

    pub fn buffer(&self) -> &Arc<MessageBuffer> {
        &self.shared.buffer
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.shared.now()
    }

    pub(crate) fn snapshot_stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            registered: self.shared.directory.len(),
            online: self.shared.directory.online_count(),
            buffered_messages: self.shared.buffer.len(),
            newest_stamp: self.shared.buffer.newest_stamp(),
        }
    }

    /// Number of live delivery lanes.
    pub fn lane_count(&self) -> usize {
        self.lanes.lock().len()
    }
}
