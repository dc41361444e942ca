use async_trait::async_trait;
use shared_types::{ParticipantAddr, ParticipantId};

use crate::domain::{
    CoordinatorError, CoordinatorStats, FanoutReport, Participant, Registration, ReplayReport,
};
use crate::ports::CoordinatorApi;
use crate::service::Coordinator;

#[async_trait]
impl CoordinatorApi for Coordinator {
    async fn register(
        &self,
        id: ParticipantId,
        address: ParticipantAddr,
    ) -> Result<Registration, CoordinatorError> {
        self.register_participant(id, address)
    }

    async fn deregister(&self, id: &ParticipantId) -> Result<Participant, CoordinatorError> {
        self.deregister_participant(id)
    }

    async fn disconnect(&self, id: &ParticipantId) -> Result<(), CoordinatorError> {
        self.disconnect_participant(id)
    }

    async fn reconnect(
        &self,
        id: &ParticipantId,
        host: Option<String>,
        port: u16,
    ) -> Result<ReplayReport, CoordinatorError> {
        self.reconnect_participant(id, host, port).await
    }

    async fn publish(
        &self,
        sender_id: ParticipantId,
        body: String,
    ) -> Result<FanoutReport, CoordinatorError> {
        self.publish_message(sender_id, body).await
    }

    async fn replay(&self, id: &ParticipantId) -> Result<ReplayReport, CoordinatorError> {
        self.replay_participant(id).await
    }

    fn lookup(&self, id: &ParticipantId) -> Option<Participant> {
        self.shared.directory.lookup(id)
    }

    fn stats(&self) -> CoordinatorStats {
        self.snapshot_stats()
    }

    fn compact(&self) -> usize {
        self.compact_buffer()
    }
}
