//! # Identity Entities
//!
//! - `ParticipantId`: opaque, stable, whitespace-free identity string
//! - `ParticipantAddr`: host and port of a participant's inbound listener

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Stable identity of a participant.
///
/// Identities travel as single protocol tokens, so they can never be empty
/// or contain whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Validate and wrap an identity token.
    pub fn new(id: impl Into<String>) -> Result<Self, ProtocolError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(ProtocolError::InvalidParticipantId(id));
        }
        Ok(Self(id))
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

/// Network location of a participant's inbound listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantAddr {
    /// IP address or hostname, kept verbatim as received.
    pub host: String,
    /// Listener port.
    pub port: u16,
}

impl ParticipantAddr {
    /// Create an address from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Same host, different port.
    #[must_use]
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            host: self.host.clone(),
            port,
        }
    }
}

impl fmt::Display for ParticipantAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_rejects_whitespace_and_empty() {
        assert!(ParticipantId::new("alice").is_ok());
        assert_eq!(
            ParticipantId::new(""),
            Err(ProtocolError::InvalidParticipantId(String::new()))
        );
        assert!(ParticipantId::new("al ice").is_err());
        assert!(ParticipantId::new("tab\there").is_err());
    }

    #[test]
    fn test_participant_id_serde_validates() {
        let id: ParticipantId = serde_json::from_str("\"p-1\"").unwrap();
        assert_eq!(id.as_str(), "p-1");
        assert!(serde_json::from_str::<ParticipantId>("\"has space\"").is_err());
    }

    #[test]
    fn test_addr_display_and_with_port() {
        let addr = ParticipantAddr::new("10.0.0.7", 5000);
        assert_eq!(addr.to_string(), "10.0.0.7:5000");
        assert_eq!(addr.with_port(6000).to_string(), "10.0.0.7:6000");
        assert_eq!(ParticipantAddr::new("::1", 80).to_string(), "[::1]:80");
    }
}
