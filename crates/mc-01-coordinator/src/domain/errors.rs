//! Domain Errors for the Coordinator

use shared_types::{ParticipantAddr, ParticipantId};
use thiserror::Error;

/// Errors returned by coordinator operations.
///
/// None of these are fatal. The command layer logs them and still
/// acknowledges the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// Operation on an id absent from the directory.
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// Replay requested for a participant that is not online.
    #[error("participant {0} is offline")]
    ParticipantOffline(ParticipantId),

    /// Delivery lanes need a tokio runtime to run on.
    #[error("no tokio runtime available to run delivery lanes")]
    RuntimeUnavailable,

    /// The participant's delivery lane stopped before completing a job.
    #[error("delivery lane for {0} closed")]
    LaneClosed(ParticipantId),
}

/// Failure to hand a line to a participant's listener.
///
/// Every variant is treated the same way by the engine: the recipient goes
/// offline and its watermark stays where it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Connect or write did not finish in time.
    #[error("delivery to {addr} timed out")]
    Timeout { addr: ParticipantAddr },

    /// Listener refused the connection.
    #[error("connection to {addr} refused")]
    ConnectionRefused { addr: ParticipantAddr },

    /// Host could not be resolved to a socket address.
    #[error("cannot resolve {addr}: {reason}")]
    InvalidAddress {
        addr: ParticipantAddr,
        reason: String,
    },

    /// Any other I/O failure.
    #[error("I/O error delivering to {addr}: {reason}")]
    Io {
        addr: ParticipantAddr,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = ParticipantId::new("alice").unwrap();
        assert_eq!(
            CoordinatorError::UnknownParticipant(id.clone()).to_string(),
            "unknown participant: alice"
        );
        assert_eq!(
            CoordinatorError::ParticipantOffline(id).to_string(),
            "participant alice is offline"
        );
        let addr = ParticipantAddr::new("127.0.0.1", 9);
        assert_eq!(
            DeliveryError::ConnectionRefused { addr }.to_string(),
            "connection to 127.0.0.1:9 refused"
        );
    }
}
