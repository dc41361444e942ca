//! # Driving Ports (Inbound API)
//!
//! The operations the transport shim dispatches parsed commands to.

use async_trait::async_trait;
use shared_types::{Command, ParticipantAddr, ParticipantId};

use crate::domain::{
    CommandOutcome, CoordinatorError, CoordinatorStats, FanoutReport, Participant, Registration,
    ReplayReport,
};

/// Primary API of the coordinator.
///
/// Session operations on an unknown id return
/// [`CoordinatorError::UnknownParticipant`] and change nothing.
///
/// # Example
///
/// ```rust,ignore
/// use mc_01_coordinator::ports::CoordinatorApi;
///
/// async fn greet<A: CoordinatorApi + ?Sized>(api: &A, id: ParticipantId) {
///     let report = api.publish(id, "hello".into()).await?;
///     println!("delivered to {} participants", report.delivered.len());
/// }
/// ```
#[async_trait]
pub trait CoordinatorApi: Send + Sync {
    /// Create or overwrite a participant, status online. No replay.
    async fn register(
        &self,
        id: ParticipantId,
        address: ParticipantAddr,
    ) -> Result<Registration, CoordinatorError>;

    /// Remove a participant. Its buffered messages stay.
    async fn deregister(&self, id: &ParticipantId) -> Result<Participant, CoordinatorError>;

    /// Mark a participant offline, keeping address and watermark.
    async fn disconnect(&self, id: &ParticipantId) -> Result<(), CoordinatorError>;

    /// Bring a participant online at a new port (and host, when given), then
    /// replay everything it is owed.
    async fn reconnect(
        &self,
        id: &ParticipantId,
        host: Option<String>,
        port: u16,
    ) -> Result<ReplayReport, CoordinatorError>;

    /// Append a message and deliver it to every online participant.
    async fn publish(
        &self,
        sender_id: ParticipantId,
        body: String,
    ) -> Result<FanoutReport, CoordinatorError>;

    /// Deliver every eligible, not yet delivered message to an online
    /// participant in stamp order.
    async fn replay(&self, id: &ParticipantId) -> Result<ReplayReport, CoordinatorError>;

    /// Copy of a directory entry.
    fn lookup(&self, id: &ParticipantId) -> Option<Participant>;

    fn stats(&self) -> CoordinatorStats;

    /// Drop buffered messages that are outside the retention window.
    fn compact(&self) -> usize;

    /// Run one parsed protocol command.
    async fn execute(&self, command: Command) -> Result<CommandOutcome, CoordinatorError> {
        match command {
            Command::Register { id, addr } => {
                self.register(id, addr).await.map(CommandOutcome::Registered)
            }
            Command::Deregister { id } => self
                .deregister(&id)
                .await
                .map(|_| CommandOutcome::Deregistered),
            Command::Disconnect { id } => self
                .disconnect(&id)
                .await
                .map(|_| CommandOutcome::Disconnected),
            Command::Reconnect { id, host, port } => self
                .reconnect(&id, host, port)
                .await
                .map(CommandOutcome::Reconnected),
            Command::Msend { id, body } => {
                self.publish(id, body).await.map(CommandOutcome::Published)
            }
        }
    }
}
