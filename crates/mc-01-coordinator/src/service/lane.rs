//! # Delivery Lanes
//!
//! One FIFO worker per participant registration. Every delivery to a
//! participant, fan-out or replay, runs through its lane, so deliveries to
//! one recipient never overlap and arrive in stamp order.
//!
//! The lane task ends when its [`LaneHandle`] is dropped and the queue is
//! drained.

use std::sync::Arc;

use shared_types::ParticipantId;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::domain::{CoordinatorError, DeliveryOutcome, Message, ReplayReport};

use super::core::Shared;

pub(crate) enum LaneJob {
    Deliver {
        message: Arc<Message>,
        /// Online period of the recipient when the message was published.
        epoch: u64,
        done: oneshot::Sender<DeliveryOutcome>,
    },
    Replay {
        done: oneshot::Sender<ReplayReport>,
    },
}

/// Sending side of a participant's lane.
pub(crate) struct LaneHandle {
    pub(crate) incarnation: u64,
    tx: mpsc::UnboundedSender<LaneJob>,
}

impl LaneHandle {
    /// Spawn the lane worker for one registration lifetime.
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        id: ParticipantId,
        incarnation: u64,
    ) -> Result<Self, CoordinatorError> {
        let runtime = current_runtime()?;
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_lane(shared, id, incarnation, rx));
        Ok(Self { incarnation, tx })
    }

    /// Queue a job. Returns false if the worker is gone.
    pub(crate) fn submit(&self, job: LaneJob) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// Handle of the Tokio runtime lanes are spawned on.
pub(crate) fn current_runtime() -> Result<Handle, CoordinatorError> {
    Handle::try_current().map_err(|_| CoordinatorError::RuntimeUnavailable)
}

async fn run_lane(
    shared: Arc<Shared>,
    id: ParticipantId,
    incarnation: u64,
    mut rx: mpsc::UnboundedReceiver<LaneJob>,
) {
    debug!(participant = %id, incarnation, "Delivery lane started");

    while let Some(job) = rx.recv().await {
        match job {
            LaneJob::Deliver {
                message,
                epoch,
                done,
            } => {
                let now = shared.now();
                let outcome = shared.attempt(&id, incarnation, epoch, &message, now).await;
                // Publisher may have stopped waiting; the outcome is already applied.
                let _ = done.send(outcome);
            }
            LaneJob::Replay { done } => {
                let report = shared.replay_in_lane(&id, incarnation).await;
                let _ = done.send(report);
            }
        }
    }

    debug!(participant = %id, incarnation, "Delivery lane closed");
}
