//! # Node Configuration
//!
//! Settings for the coordinator process, loaded in three layers:
//! defaults, then an optional file, then `MC_*` environment variables.
//!
//! Two file formats are accepted:
//!
//! ```text
//! # legacy: two lines
//! 5000        <- listener port
//! 60          <- persistence time in seconds
//! ```
//!
//! ```toml
//! [listener]
//! bind_addr = "0.0.0.0"
//! port = 5000
//!
//! [retention]
//! persistence_time_secs = 60
//!
//! [delivery]
//! connect_timeout_ms = 2000
//! write_timeout_ms = 2000
//!
//! [compaction]
//! enabled = true
//! interval_secs = 30
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use mc_01_coordinator::{ConfigProvider, DeliveryConfig, ListenerConfig, RetentionConfig};
use serde::Deserialize;
use thiserror::Error;

/// Complete coordinator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Command listener.
    pub listener: ListenerSettings,
    /// Retention window.
    pub retention: RetentionSettings,
    /// Outbound delivery timeouts.
    pub delivery: DeliverySettings,
    /// Background buffer compaction.
    pub compaction: CompactionSettings,
}

/// Command listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// TCP port for commands.
    pub port: u16,
    /// How long a client may take to send its command line.
    pub read_timeout_ms: u64,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            read_timeout_ms: 5_000,
        }
    }
}

/// Retention configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionSettings {
    /// How long a message stays eligible for replay.
    pub persistence_time_secs: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            persistence_time_secs: 60,
        }
    }
}

/// Delivery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        let defaults = DeliveryConfig::default();
        Self {
            connect_timeout_ms: defaults.connect_timeout_ms,
            write_timeout_ms: defaults.write_timeout_ms,
        }
    }
}

/// Compaction configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionSettings {
    pub enabled: bool,
    /// Seconds between compaction passes.
    pub interval_secs: u64,
}

impl Default for CompactionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Bad line in a legacy two-line file.
    #[error("Invalid legacy config line {line}: {reason}")]
    Legacy { line: usize, reason: String },

    /// Environment override that does not parse.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    /// Values that parse but cannot run.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// File formats
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    listener: ListenerFile,
    #[serde(default)]
    retention: RetentionFile,
    #[serde(default)]
    delivery: DeliveryFile,
    #[serde(default)]
    compaction: CompactionFile,
}

#[derive(Debug, Deserialize, Default)]
struct ListenerFile {
    bind_addr: Option<IpAddr>,
    port: Option<u16>,
    read_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RetentionFile {
    persistence_time_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DeliveryFile {
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CompactionFile {
    enabled: Option<bool>,
    interval_secs: Option<u64>,
}

impl NodeConfig {
    /// Load configuration from a file in either format.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse file content, telling the legacy format apart by its first
    /// non-empty line being a bare number.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let first = content.lines().map(str::trim).find(|l| !l.is_empty());
        match first {
            Some(line) if line.bytes().all(|b| b.is_ascii_digit()) => Self::parse_legacy(content),
            _ => Self::parse_toml(content),
        }
    }

    /// Two lines: listener port, then persistence time in seconds.
    pub fn parse_legacy(content: &str) -> Result<Self, ConfigError> {
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(n, l)| (n + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (port_line, port) = lines.next().ok_or(ConfigError::Legacy {
            line: 1,
            reason: "missing port".to_string(),
        })?;
        let port: u16 = port.parse().map_err(|_| ConfigError::Legacy {
            line: port_line,
            reason: format!("{port:?} is not a port number"),
        })?;

        let (secs_line, secs) = lines.next().ok_or(ConfigError::Legacy {
            line: port_line + 1,
            reason: "missing persistence time".to_string(),
        })?;
        let persistence_time_secs: u64 = secs.parse().map_err(|_| ConfigError::Legacy {
            line: secs_line,
            reason: format!("{secs:?} is not a number of seconds"),
        })?;

        if let Some((line, extra)) = lines.next() {
            return Err(ConfigError::Legacy {
                line,
                reason: format!("unexpected content {extra:?}"),
            });
        }

        let mut config = Self::default();
        config.listener.port = port;
        config.retention.persistence_time_secs = persistence_time_secs;
        Ok(config)
    }

    /// Parse the TOML format. Missing keys keep their defaults.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let defaults = Self::default();

        Ok(Self {
            listener: ListenerSettings {
                bind_addr: file.listener.bind_addr.unwrap_or(defaults.listener.bind_addr),
                port: file.listener.port.unwrap_or(defaults.listener.port),
                read_timeout_ms: file
                    .listener
                    .read_timeout_ms
                    .unwrap_or(defaults.listener.read_timeout_ms),
            },
            retention: RetentionSettings {
                persistence_time_secs: file
                    .retention
                    .persistence_time_secs
                    .unwrap_or(defaults.retention.persistence_time_secs),
            },
            delivery: DeliverySettings {
                connect_timeout_ms: file
                    .delivery
                    .connect_timeout_ms
                    .unwrap_or(defaults.delivery.connect_timeout_ms),
                write_timeout_ms: file
                    .delivery
                    .write_timeout_ms
                    .unwrap_or(defaults.delivery.write_timeout_ms),
            },
            compaction: CompactionSettings {
                enabled: file.compaction.enabled.unwrap_or(defaults.compaction.enabled),
                interval_secs: file
                    .compaction
                    .interval_secs
                    .unwrap_or(defaults.compaction.interval_secs),
            },
        })
    }

    /// Apply `MC_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source.
    ///
    /// - `MC_PORT`, `MC_BIND_ADDR`
    /// - `MC_PERSISTENCE_SECS`
    /// - `MC_DELIVERY_TIMEOUT_MS` (connect and write)
    /// - `MC_COMPACTION_INTERVAL_SECS`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = parse_var(&lookup, "MC_PORT")? {
            self.listener.port = port;
        }
        if let Some(addr) = parse_var(&lookup, "MC_BIND_ADDR")? {
            self.listener.bind_addr = addr;
        }
        if let Some(secs) = parse_var(&lookup, "MC_PERSISTENCE_SECS")? {
            self.retention.persistence_time_secs = secs;
        }
        if let Some(ms) = parse_var(&lookup, "MC_DELIVERY_TIMEOUT_MS")? {
            self.delivery.connect_timeout_ms = ms;
            self.delivery.write_timeout_ms = ms;
        }
        if let Some(secs) = parse_var(&lookup, "MC_COMPACTION_INTERVAL_SECS")? {
            self.compaction.interval_secs = secs;
        }
        Ok(())
    }

    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.port == 0 {
            return Err(ConfigError::Invalid("listener port must be non-zero".into()));
        }
        if self.listener.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("listener read timeout must be non-zero".into()));
        }
        if self.delivery.connect_timeout_ms == 0 || self.delivery.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid("delivery timeouts must be non-zero".into()));
        }
        if self.compaction.enabled && self.compaction.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "compaction interval must be non-zero when enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listener.bind_addr, self.listener.port)
    }

    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            read_timeout: Duration::from_millis(self.listener.read_timeout_ms),
            ..ListenerConfig::default()
        }
    }

    pub fn compaction_interval(&self) -> Duration {
        Duration::from_secs(self.compaction.interval_secs)
    }
}

impl ConfigProvider for NodeConfig {
    fn retention_config(&self) -> RetentionConfig {
        RetentionConfig::from_secs(self.retention.persistence_time_secs)
    }

    fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            connect_timeout_ms: self.delivery.connect_timeout_ms,
            write_timeout_ms: self.delivery.write_timeout_ms,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
