//! Participant client errors.

use std::path::PathBuf;

use shared_types::ProtocolError;
use thiserror::Error;

use super::state::{ClientState, Transition};

/// Errors surfaced to the interactive loop.
///
/// None of them end the program; the loop prints the error and reads the
/// next command.
#[derive(Debug, Error)]
pub enum ParticipantError {
    /// Local state forbids the command; the coordinator was not contacted.
    #[error("cannot {transition} while {state}")]
    InvalidTransition {
        state: ClientState,
        transition: Transition,
    },

    /// Input line is not a known command.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Known command with bad arguments.
    #[error("usage: {usage}")]
    Usage { usage: &'static str },

    /// Command would produce an invalid protocol line.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Connecting to or talking with the coordinator failed.
    #[error("coordinator {addr} unreachable: {reason}")]
    CoordinatorUnreachable { addr: String, reason: String },

    /// Coordinator answered with something other than the ack line.
    #[error("coordinator did not acknowledge {verb}: got {reply:?}")]
    NotAcknowledged { verb: &'static str, reply: String },

    /// No ack within the configured timeout.
    #[error("timed out waiting for coordinator {addr}")]
    Timeout { addr: String },

    /// Receiver could not bind its port.
    #[error("cannot listen on port {port}: {reason}")]
    ReceiverBind { port: u16, reason: String },

    /// Message log could not be written.
    #[error("cannot write message log {}: {reason}", .path.display())]
    Log { path: PathBuf, reason: String },

    /// Configuration file is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
