//! # Client Session State
//!
//! ```text
//!                register            disconnect
//!  Unregistered ─────────→ Online ─────────────→ Offline
//!       ↑                   │  ↑                    │
//!       │    deregister     │  └──── reconnect ─────┘
//!       └───────────────────┴───────────────────────┘
//! ```
//!
//! The participant checks a transition locally before it contacts the
//! coordinator, and commits it only after the coordinator acknowledges.

use std::fmt;

use super::errors::ParticipantError;

/// Where the participant believes it stands with the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Unregistered,
    Online,
    Offline,
}

/// A session-changing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Register,
    Deregister,
    Disconnect,
    Reconnect,
    Send,
}

impl ClientState {
    /// State after `transition`, or the reason it is not allowed.
    pub fn next(self, transition: Transition) -> Result<ClientState, ParticipantError> {
        use ClientState::*;
        use Transition::*;

        match (self, transition) {
            (Unregistered, Register) => Ok(Online),
            (Online | Offline, Deregister) => Ok(Unregistered),
            (Online, Disconnect) => Ok(Offline),
            (Offline, Reconnect) => Ok(Online),
            (Online, Send) => Ok(Online),
            (state, transition) => Err(ParticipantError::InvalidTransition { state, transition }),
        }
    }

    /// True while the receiver should be running.
    pub fn is_online(self) -> bool {
        self == ClientState::Online
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Unregistered => write!(f, "unregistered"),
            ClientState::Online => write!(f, "online"),
            ClientState::Offline => write!(f, "offline"),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Transition::Register => "register",
            Transition::Deregister => "deregister",
            Transition::Disconnect => "disconnect",
            Transition::Reconnect => "reconnect",
            Transition::Send => "msend",
        };
        f.write_str(verb)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientState::*;
    use super::Transition::*;
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(Unregistered.next(Register).unwrap(), Online);
        assert_eq!(Online.next(Send).unwrap(), Online);
        assert_eq!(Online.next(Disconnect).unwrap(), Offline);
        assert_eq!(Offline.next(Reconnect).unwrap(), Online);
        assert_eq!(Online.next(Deregister).unwrap(), Unregistered);
        assert_eq!(Offline.next(Deregister).unwrap(), Unregistered);
    }

    #[test]
    fn test_rejected_transitions() {
        let rejected = [
            (Online, Register),
            (Offline, Register),
            (Online, Reconnect),
            (Unregistered, Reconnect),
            (Offline, Send),
            (Unregistered, Send),
            (Offline, Disconnect),
            (Unregistered, Disconnect),
            (Unregistered, Deregister),
        ];
        for (state, transition) in rejected {
            assert!(
                matches!(
                    state.next(transition),
                    Err(ParticipantError::InvalidTransition { .. })
                ),
                "{transition} should be rejected while {state}"
            );
        }
    }

    #[test]
    fn test_default_is_unregistered() {
        assert_eq!(ClientState::default(), Unregistered);
        assert!(!Unregistered.is_online());
    }
}
