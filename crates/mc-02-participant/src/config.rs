//! # Participant Configuration
//!
//! Legacy three-line file:
//!
//! ```text
//! alice                 <- participant id
//! /tmp/alice.log        <- message log
//! 127.0.0.1 5000        <- coordinator host and port
//! ```
//!
//! Or TOML:
//!
//! ```toml
//! id = "alice"
//! log_file = "/tmp/alice.log"
//!
//! [coordinator]
//! host = "127.0.0.1"
//! port = 5000
//! ack_timeout_ms = 5000
//!
//! [receiver]
//! bind_addr = "0.0.0.0"
//! advertise_host = "127.0.0.1"
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use shared_types::ParticipantId;

use crate::domain::ParticipantError;

/// Default host announced to the coordinator in register/reconnect lines.
pub const DEFAULT_ADVERTISE_HOST: &str = "127.0.0.1";

/// Complete participant configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantConfig {
    pub id: ParticipantId,
    /// File every received message is appended to.
    pub log_file: PathBuf,
    pub coordinator_host: String,
    pub coordinator_port: u16,
    /// How long to wait for the coordinator's ack.
    pub ack_timeout_ms: u64,
    /// Interface the receiver binds.
    pub bind_addr: IpAddr,
    /// Host the coordinator should deliver to.
    pub advertise_host: String,
}

impl ParticipantConfig {
    pub fn new(
        id: ParticipantId,
        log_file: impl Into<PathBuf>,
        coordinator_host: impl Into<String>,
        coordinator_port: u16,
    ) -> Self {
        Self {
            id,
            log_file: log_file.into(),
            coordinator_host: coordinator_host.into(),
            coordinator_port,
            ack_timeout_ms: 5_000,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            advertise_host: DEFAULT_ADVERTISE_HOST.to_string(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ParticipantError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ParticipantError::Config(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::parse(&content)
    }

    /// TOML if the content parses as a table with an `id` key, legacy
    /// otherwise.
    pub fn parse(content: &str) -> Result<Self, ParticipantError> {
        let looks_like_toml = content
            .lines()
            .map(str::trim)
            .any(|l| l.starts_with("id") && l.contains('='));
        if looks_like_toml {
            Self::parse_toml(content)
        } else {
            Self::parse_legacy(content)
        }
    }

    pub fn parse_legacy(content: &str) -> Result<Self, ParticipantError> {
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

        let id = lines
            .next()
            .ok_or_else(|| ParticipantError::Config("line 1: missing participant id".into()))?;
        let log_file = lines
            .next()
            .ok_or_else(|| ParticipantError::Config("line 2: missing log file".into()))?;
        let coordinator = lines.next().ok_or_else(|| {
            ParticipantError::Config("line 3: missing coordinator host and port".into())
        })?;

        let mut parts = coordinator.split_whitespace();
        let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParticipantError::Config(format!(
                "line 3: expected `<host> <port>`, got {coordinator:?}"
            )));
        };
        let port = parse_port(port)?;

        Ok(Self::new(ParticipantId::new(id)?, log_file, host, port))
    }

    pub fn parse_toml(content: &str) -> Result<Self, ParticipantError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ParticipantError::Config(e.to_string()))?;
        let mut config = Self::new(
            ParticipantId::new(file.id)?,
            file.log_file,
            file.coordinator.host,
            file.coordinator.port,
        );
        if config.coordinator_port == 0 {
            return Err(ParticipantError::Config("coordinator port must be non-zero".into()));
        }
        if let Some(ms) = file.coordinator.ack_timeout_ms {
            config.ack_timeout_ms = ms;
        }
        if let Some(addr) = file.receiver.bind_addr {
            config.bind_addr = addr;
        }
        if let Some(host) = file.receiver.advertise_host {
            config.advertise_host = host;
        }
        Ok(config)
    }

    /// `host:port` of the coordinator's command listener.
    pub fn coordinator_addr(&self) -> String {
        format!("{}:{}", self.coordinator_host, self.coordinator_port)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    id: String,
    log_file: PathBuf,
    coordinator: CoordinatorFile,
    #[serde(default)]
    receiver: ReceiverFile,
}

#[derive(Debug, Deserialize)]
struct CoordinatorFile {
    host: String,
    port: u16,
    ack_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ReceiverFile {
    bind_addr: Option<IpAddr>,
    advertise_host: Option<String>,
}

fn parse_port(value: &str) -> Result<u16, ParticipantError> {
    match value.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ParticipantError::Config(format!(
            "line 3: {value:?} is not a port number"
        ))),
    }
}
