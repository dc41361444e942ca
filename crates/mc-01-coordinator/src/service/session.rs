//! # Session State Machine
//!
//! ```text
//!   (absent) --register--> Online <--reconnect-- Offline
//!                            |  \--disconnect/failed delivery-->/
//!                            |
//!   any state --deregister--> (absent)
//! ```
//!
//! Register on a known id renews the entry: new address, status online,
//! watermark kept. Only reconnect triggers a replay.

use shared_types::{ParticipantAddr, ParticipantId};
use tracing::{debug, info};

use crate::domain::{
    CoordinatorError, Participant, ParticipantStatus, Registration, ReplayReport,
};

use super::core::Coordinator;
use super::lane::current_runtime;

impl Coordinator {
    pub(crate) fn register_participant(
        &self,
        id: ParticipantId,
        address: ParticipantAddr,
    ) -> Result<Registration, CoordinatorError> {
        current_runtime()?;
        let mut lanes = self.lanes.lock();
        let (participant, registration) =
            self.shared.directory.register(id, address, self.now());
        self.ensure_lane(&mut lanes, &participant)?;
        drop(lanes);

        info!(
            participant = %participant.id,
            address = %participant.address,
            incarnation = participant.incarnation,
            renewed = matches!(registration, Registration::Renewed { .. }),
            "Participant registered"
        );
        self.shared.report_gauges();
        Ok(registration)
    }

    pub(crate) fn deregister_participant(
        &self,
        id: &ParticipantId,
    ) -> Result<Participant, CoordinatorError> {
        let mut lanes = self.lanes.lock();
        let removed = self
            .shared
            .directory
            .remove(id)
            .ok_or_else(|| CoordinatorError::UnknownParticipant(id.clone()))?;
        // Worker drains what is queued; every job then sees the id absent.
        lanes.remove(id);
        drop(lanes);

        info!(participant = %id, "Participant deregistered");
        self.shared.report_gauges();
        Ok(removed)
    }

    pub(crate) fn disconnect_participant(&self, id: &ParticipantId) -> Result<(), CoordinatorError> {
        let previous = self
            .shared
            .directory
            .set_status(id, ParticipantStatus::Offline, self.now())
            .ok_or_else(|| CoordinatorError::UnknownParticipant(id.clone()))?;

        if previous == ParticipantStatus::Offline {
            debug!(participant = %id, "Disconnect on offline participant");
        } else {
            info!(participant = %id, "Participant disconnected");
        }
        self.shared.report_gauges();
        Ok(())
    }

    pub(crate) async fn reconnect_participant(
        &self,
        id: &ParticipantId,
        host: Option<String>,
        port: u16,
    ) -> Result<ReplayReport, CoordinatorError> {
        let done = {
            let mut lanes = self.lanes.lock();
            let participant = self
                .shared
                .directory
                .reconnect(id, host, port)
                .ok_or_else(|| CoordinatorError::UnknownParticipant(id.clone()))?;
            info!(
                participant = %participant.id,
                address = %participant.address,
                watermark = %participant.delivery_watermark,
                "Participant reconnected"
            );
            self.submit_replay(&mut lanes, &participant)?
        };
        self.shared.report_gauges();

        done.await
            .map_err(|_| CoordinatorError::LaneClosed(id.clone()))
    }
}
