//! # Fan-out / Replay Engine
//!
//! - `publish`: append, then queue the new message on the lane of every
//!   participant in the online snapshot
//! - `replay`: queue a catch-up on one participant's lane
//!
//! A single delivery re-reads the directory entry first. It is skipped if the
//! participant went offline, belongs to another registration lifetime or
//! online period, has already received the message, or if the message aged
//! out while queued.
//! On success the watermark is raised to the message stamp. On failure the
//! participant is flipped offline and the watermark stays put.

use std::sync::Arc;
use std::time::Instant;

use shared_types::ParticipantId;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::domain::{
    CoordinatorError, DeliveryOutcome, FanoutReport, Message, Participant, ReplayReport,
    SkipReason, Timestamp,
};

use super::core::{Coordinator, Shared};
use super::lane::{LaneHandle, LaneJob};

impl Shared {
    /// Check the recipient's current state and deliver if still owed.
    pub(crate) async fn attempt(
        &self,
        id: &ParticipantId,
        incarnation: u64,
        epoch: u64,
        message: &Message,
        now: Timestamp,
    ) -> DeliveryOutcome {
        let participant = match self.directory.lookup(id) {
            Some(p) if p.incarnation == incarnation => p,
            _ => return DeliveryOutcome::Skipped(SkipReason::Deregistered),
        };
        if !participant.is_online() {
            return DeliveryOutcome::Skipped(SkipReason::Offline);
        }
        if participant.epoch != epoch {
            return DeliveryOutcome::Skipped(SkipReason::Superseded);
        }
        if !participant.awaits(message.stamp()) {
            return DeliveryOutcome::Skipped(SkipReason::AlreadyDelivered);
        }
        if !self.buffer.retention().is_within(message.timestamp, now) {
            return DeliveryOutcome::Skipped(SkipReason::Expired);
        }
        self.send(&participant, message).await
    }

    /// One transient connection, one line.
    async fn send(&self, participant: &Participant, message: &Message) -> DeliveryOutcome {
        let line = message.delivery_line();
        let started = Instant::now();
        let result = self.transport.deliver(&participant.address, &line).await;
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(()) => {
                let watermark = self
                    .directory
                    .advance_watermark(&participant.id, participant.incarnation, message.stamp())
                    .unwrap_or(participant.delivery_watermark.max(message.stamp()));
                debug!(
                    participant = %participant.id,
                    address = %participant.address,
                    stamp = %message.stamp(),
                    "Message delivered"
                );
                DeliveryOutcome::Delivered { watermark }
            }
            Err(error) => {
                let flipped =
                    self.directory.mark_offline(
                        &participant.id,
                        participant.incarnation,
                        participant.epoch,
                        self.now(),
                    );
                warn!(
                    participant = %participant.id,
                    address = %participant.address,
                    stamp = %message.stamp(),
                    error = %error,
                    marked_offline = flipped,
                    "Delivery failed"
                );
                if flipped {
                    self.report_gauges();
                }
                DeliveryOutcome::Failed(error)
            }
        };
        self.metrics.delivery(outcome.label(), elapsed);
        outcome
    }

    /// Deliver everything the participant is owed, in stamp order.
    ///
    /// Runs inside the participant's lane. Stops at the first failure or as
    /// soon as the participant is no longer online.
    pub(crate) async fn replay_in_lane(&self, id: &ParticipantId, incarnation: u64) -> ReplayReport {
        let mut report = ReplayReport::default();
        let (watermark, epoch) = match self.directory.lookup(id) {
            Some(p) if p.incarnation == incarnation && p.is_online() => {
                (p.delivery_watermark, p.epoch)
            }
            _ => {
                report.interrupted = true;
                return report;
            }
        };

        let now = self.now();
        let mut eligible = self.buffer.eligible_since(watermark, now);
        for message in eligible.by_ref() {
            match self.attempt(id, incarnation, epoch, &message, now).await {
                DeliveryOutcome::Delivered { .. } => report.delivered += 1,
                DeliveryOutcome::Failed(error) => {
                    report.failure = Some(error);
                    break;
                }
                DeliveryOutcome::Skipped(
                    SkipReason::Offline | SkipReason::Deregistered | SkipReason::Superseded,
                ) => {
                    report.interrupted = true;
                    break;
                }
                DeliveryOutcome::Skipped(SkipReason::AlreadyDelivered | SkipReason::Expired) => {}
            }
        }
        report.expired = eligible.expired();

        info!(
            participant = %id,
            delivered = report.delivered,
            expired = report.expired,
            interrupted = report.interrupted,
            failed = report.failure.is_some(),
            "Replay finished"
        );
        self.metrics.replay_finished(&report);
        report
    }
}

impl Coordinator {
    pub(crate) async fn publish_message(
        &self,
        sender_id: ParticipantId,
        body: String,
    ) -> Result<FanoutReport, CoordinatorError> {
        let (message, pending) = {
            let lanes = self.lanes.lock();
            let message = self.shared.buffer.append(sender_id, body, self.now());
            let mut pending = Vec::new();
            for recipient in self.shared.directory.online_snapshot() {
                let Some(lane) = lanes
                    .get(&recipient.id)
                    .filter(|lane| lane.incarnation == recipient.incarnation)
                else {
                    continue;
                };
                let (done, outcome) = oneshot::channel();
                if lane.submit(LaneJob::Deliver {
                    message: Arc::clone(&message),
                    epoch: recipient.epoch,
                    done,
                }) {
                    pending.push((recipient.id, outcome));
                }
            }
            (message, pending)
        };

        self.shared.metrics.message_published();
        debug!(
            sender = %message.sender_id,
            stamp = %message.stamp(),
            recipients = pending.len(),
            "Message appended"
        );

        let mut report = FanoutReport::new(message);
        for (id, outcome) in pending {
            match outcome.await {
                Ok(DeliveryOutcome::Delivered { .. }) => report.delivered.push(id),
                Ok(DeliveryOutcome::Failed(_)) => report.failed.push(id),
                Ok(DeliveryOutcome::Skipped(_)) | Err(_) => report.skipped.push(id),
            }
        }
        self.shared.report_gauges();
        Ok(report)
    }

    /// Queue a replay on an online participant's lane and wait for it.
    pub(crate) async fn replay_participant(
        &self,
        id: &ParticipantId,
    ) -> Result<ReplayReport, CoordinatorError> {
        let done = {
            let mut lanes = self.lanes.lock();
            let participant = self
                .shared
                .directory
                .lookup(id)
                .ok_or_else(|| CoordinatorError::UnknownParticipant(id.clone()))?;
            if !participant.is_online() {
                return Err(CoordinatorError::ParticipantOffline(id.clone()));
            }
            self.submit_replay(&mut lanes, &participant)?
        };
        done.await
            .map_err(|_| CoordinatorError::LaneClosed(id.clone()))
    }

    /// Queue a replay job, respawning the lane if it is missing or stale.
    pub(crate) fn submit_replay(
        &self,
        lanes: &mut std::collections::HashMap<ParticipantId, LaneHandle>,
        participant: &Participant,
    ) -> Result<oneshot::Receiver<ReplayReport>, CoordinatorError> {
        let (done, report) = oneshot::channel();
        let lane = self.ensure_lane(lanes, participant)?;
        if !lane.submit(LaneJob::Replay { done }) {
            return Err(CoordinatorError::LaneClosed(participant.id.clone()));
        }
        Ok(report)
    }

    /// Lane for the participant's current incarnation, spawned on demand.
    pub(crate) fn ensure_lane<'a>(
        &self,
        lanes: &'a mut std::collections::HashMap<ParticipantId, LaneHandle>,
        participant: &Participant,
    ) -> Result<&'a LaneHandle, CoordinatorError> {
        let stale = lanes
            .get(&participant.id)
            .map_or(true, |lane| lane.incarnation != participant.incarnation);
        if stale {
            let lane = LaneHandle::spawn(
                Arc::clone(&self.shared),
                participant.id.clone(),
                participant.incarnation,
            )?;
            lanes.insert(participant.id.clone(), lane);
        }
        lanes
            .get(&participant.id)
            .ok_or_else(|| CoordinatorError::LaneClosed(participant.id.clone()))
    }
}
