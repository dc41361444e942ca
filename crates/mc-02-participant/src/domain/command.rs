//! Commands typed at the participant prompt.

use std::str::FromStr;

use super::errors::ParticipantError;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Start the receiver on `port` and register.
    Register { port: u16 },
    Deregister,
    Disconnect,
    /// Start the receiver on `port` and reconnect.
    Reconnect { port: u16 },
    /// Publish the rest of the line.
    Msend { message: String },
    /// Deregister if needed and quit.
    Exit,
}

impl UserCommand {
    /// Help text printed at startup.
    pub const HELP: &'static str = "\
Available commands:
  register <port>   - Register with the coordinator
  deregister        - Leave the multicast group
  disconnect        - Temporarily go offline
  reconnect <port>  - Come back online and receive missed messages
  msend <message>   - Send a multicast message
  exit              - Exit the participant program";

    pub fn parse(line: &str) -> Result<Self, ParticipantError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim_start()),
            None => (line, ""),
        };

        match verb {
            "register" => Ok(Self::Register {
                port: parse_port(rest, "register <port>")?,
            }),
            "reconnect" => Ok(Self::Reconnect {
                port: parse_port(rest, "reconnect <port>")?,
            }),
            "deregister" => no_args(rest, "deregister", Self::Deregister),
            "disconnect" => no_args(rest, "disconnect", Self::Disconnect),
            "exit" => no_args(rest, "exit", Self::Exit),
            "msend" if rest.is_empty() => Err(ParticipantError::Usage {
                usage: "msend <message>",
            }),
            "msend" => Ok(Self::Msend {
                message: rest.to_string(),
            }),
            _ => Err(ParticipantError::UnknownCommand(line.to_string())),
        }
    }
}

impl FromStr for UserCommand {
    type Err = ParticipantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_port(arg: &str, usage: &'static str) -> Result<u16, ParticipantError> {
    match arg.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ParticipantError::Usage { usage }),
    }
}

fn no_args(
    rest: &str,
    usage: &'static str,
    command: UserCommand,
) -> Result<UserCommand, ParticipantError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParticipantError::Usage { usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            UserCommand::parse("register 6001").unwrap(),
            UserCommand::Register { port: 6001 }
        );
        assert_eq!(
            UserCommand::parse("  reconnect   6002 ").unwrap(),
            UserCommand::Reconnect { port: 6002 }
        );
        assert_eq!(UserCommand::parse("deregister").unwrap(), UserCommand::Deregister);
        assert_eq!(UserCommand::parse("disconnect").unwrap(), UserCommand::Disconnect);
        assert_eq!(UserCommand::parse("exit").unwrap(), UserCommand::Exit);
    }

    #[test]
    fn test_msend_keeps_inner_spacing() {
        assert_eq!(
            UserCommand::parse("msend hello   big world").unwrap(),
            UserCommand::Msend {
                message: "hello   big world".into()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            UserCommand::parse("msend"),
            Err(ParticipantError::Usage { .. })
        ));
        assert!(matches!(
            UserCommand::parse("register"),
            Err(ParticipantError::Usage { .. })
        ));
        assert!(matches!(
            UserCommand::parse("register abc"),
            Err(ParticipantError::Usage { .. })
        ));
        assert!(matches!(
            UserCommand::parse("reconnect 0"),
            Err(ParticipantError::Usage { .. })
        ));
        assert!(matches!(
            UserCommand::parse("disconnect now"),
            Err(ParticipantError::Usage { .. })
        ));
        assert!(matches!(
            UserCommand::parse("publish hi"),
            Err(ParticipantError::UnknownCommand(_))
        ));
    }
}
