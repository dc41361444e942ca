//! # Error Types
//!
//! Errors raised while parsing protocol lines.

use thiserror::Error;

/// A line that cannot be turned into a command.
///
/// Malformed lines never reach the coordinator core, so none of these
/// variants can cause a state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Line was empty or whitespace only.
    #[error("empty command line")]
    Empty,

    /// First token is not a known verb.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong number of tokens for the verb.
    #[error("{command}: expected {expected} arguments, found {found}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
        found: usize,
    },

    /// Port token is not a non-zero u16.
    #[error("invalid port: {value}")]
    InvalidPort { value: String },

    /// Participant identity is empty or contains whitespace.
    #[error("invalid participant id: {0:?}")]
    InvalidParticipantId(String),

    /// Host token is empty.
    #[error("invalid host: {0:?}")]
    InvalidHost(String),

    /// `msend` without any words after the id.
    #[error("msend requires a non-empty message body")]
    EmptyBody,

    /// Line exceeds the configured maximum.
    #[error("line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::WrongArity {
            command: "register",
            expected: "3",
            found: 1,
        };
        assert_eq!(err.to_string(), "register: expected 3 arguments, found 1");
        assert_eq!(
            ProtocolError::InvalidPort {
                value: "abc".into()
            }
            .to_string(),
            "invalid port: abc"
        );
    }
}
