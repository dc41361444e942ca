//! # Runtime Container
//!
//! Configuration for the coordinator process and the wiring that turns it
//! into a running coordinator.

pub mod config;

pub use config::{
    CompactionSettings, ConfigError, DeliverySettings, ListenerSettings, NodeConfig,
    RetentionSettings,
};
