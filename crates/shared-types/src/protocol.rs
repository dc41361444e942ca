//! # Line Protocol
//!
//! One command per connection, one line, space-delimited tokens.
//!
//! | Command | Format |
//! |---|---|
//! | register | `register <id> <ip> <port>` |
//! | deregister | `deregister <id>` |
//! | disconnect | `disconnect <id>` |
//! | reconnect | `reconnect <id> <port>` or `reconnect <id> <ip> <port>` |
//! | msend | `msend <id> <words...>` |
//!
//! The coordinator answers every request with [`ACK_LINE`]. Deliveries use the
//! same `msend` shape in the reverse direction: `msend <senderId> <body>`.

use std::fmt;
use std::str::FromStr;

use crate::entities::{ParticipantAddr, ParticipantId};
use crate::errors::ProtocolError;

/// Fixed acknowledgement written back for every request.
pub const ACK_LINE: &str = "ack";

/// Upper bound on a single protocol line, in bytes.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// A parsed coordinator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create or overwrite a participant, status online.
    Register {
        id: ParticipantId,
        addr: ParticipantAddr,
    },
    /// Remove a participant.
    Deregister { id: ParticipantId },
    /// Mark a participant offline.
    Disconnect { id: ParticipantId },
    /// Mark a participant online at a new port (and optionally host), then replay.
    Reconnect {
        id: ParticipantId,
        host: Option<String>,
        port: u16,
    },
    /// Publish `body` on behalf of `id`.
    Msend { id: ParticipantId, body: String },
}

impl Command {
    /// Parse one request line. Trailing `\r`/`\n` are ignored.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = strip_line_ending(line);
        if line.len() > MAX_LINE_LEN {
            return Err(ProtocolError::LineTooLong {
                len: line.len(),
                max: MAX_LINE_LEN,
            });
        }

        let (verb, rest) = next_token(line).ok_or(ProtocolError::Empty)?;
        match verb {
            "register" => {
                let args = exact_args("register", rest, &[3])?;
                Ok(Self::Register {
                    id: ParticipantId::new(args[0])?,
                    addr: ParticipantAddr::new(parse_host(args[1])?, parse_port(args[2])?),
                })
            }
            "deregister" => {
                let args = exact_args("deregister", rest, &[1])?;
                Ok(Self::Deregister {
                    id: ParticipantId::new(args[0])?,
                })
            }
            "disconnect" => {
                let args = exact_args("disconnect", rest, &[1])?;
                Ok(Self::Disconnect {
                    id: ParticipantId::new(args[0])?,
                })
            }
            "reconnect" => {
                let args = exact_args("reconnect", rest, &[2, 3])?;
                let id = ParticipantId::new(args[0])?;
                if args.len() == 3 {
                    Ok(Self::Reconnect {
                        id,
                        host: Some(parse_host(args[1])?),
                        port: parse_port(args[2])?,
                    })
                } else {
                    Ok(Self::Reconnect {
                        id,
                        host: None,
                        port: parse_port(args[1])?,
                    })
                }
            }
            "msend" => {
                let (id, body) = next_token(rest).ok_or(ProtocolError::WrongArity {
                    command: "msend",
                    expected: "at least 2",
                    found: 0,
                })?;
                let body = body.trim_start();
                if body.is_empty() {
                    return Err(ProtocolError::EmptyBody);
                }
                Ok(Self::Msend {
                    id: ParticipantId::new(id)?,
                    body: body.to_string(),
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    /// Protocol verb of this command.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Deregister { .. } => "deregister",
            Self::Disconnect { .. } => "disconnect",
            Self::Reconnect { .. } => "reconnect",
            Self::Msend { .. } => "msend",
        }
    }

    /// Participant the command refers to (the sender for `msend`).
    pub fn participant(&self) -> &ParticipantId {
        match self {
            Self::Register { id, .. }
            | Self::Deregister { id }
            | Self::Disconnect { id }
            | Self::Reconnect { id, .. }
            | Self::Msend { id, .. } => id,
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { id, addr } => {
                write!(f, "register {} {} {}", id, addr.host, addr.port)
            }
            Self::Deregister { id } => write!(f, "deregister {id}"),
            Self::Disconnect { id } => write!(f, "disconnect {id}"),
            Self::Reconnect {
                id,
                host: Some(host),
                port,
            } => write!(f, "reconnect {id} {host} {port}"),
            Self::Reconnect {
                id,
                host: None,
                port,
            } => write!(f, "reconnect {id} {port}"),
            Self::Msend { id, body } => write!(f, "msend {id} {body}"),
        }
    }
}

/// A message as delivered to a participant's listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLine {
    /// Original publisher.
    pub sender: ParticipantId,
    /// Message body, verbatim.
    pub body: String,
}

impl DeliveryLine {
    pub fn new(sender: ParticipantId, body: impl Into<String>) -> Self {
        Self {
            sender,
            body: body.into(),
        }
    }

    /// Parse a delivery received by a participant listener.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        match Command::parse(line)? {
            Command::Msend { id, body } => Ok(Self { sender: id, body }),
            other => Err(ProtocolError::UnknownCommand(other.verb().to_string())),
        }
    }
}

impl fmt::Display for DeliveryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msend {} {}", self.sender, self.body)
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Split off the first whitespace-delimited token, returning it and the
/// untouched remainder.
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn exact_args<'a>(
    command: &'static str,
    rest: &'a str,
    allowed: &[usize],
) -> Result<Vec<&'a str>, ProtocolError> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    if allowed.contains(&args.len()) {
        return Ok(args);
    }
    let expected = match allowed {
        [1] => "1",
        [3] => "3",
        _ => "2 or 3",
    };
    Err(ProtocolError::WrongArity {
        command,
        expected,
        found: args.len(),
    })
}

fn parse_port(token: &str) -> Result<u16, ProtocolError> {
    match token.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ProtocolError::InvalidPort {
            value: token.to_string(),
        }),
    }
}

fn parse_host(token: &str) -> Result<String, ProtocolError> {
    if token.is_empty() {
        return Err(ProtocolError::InvalidHost(token.to_string()));
    }
    Ok(token.to_string())
}
