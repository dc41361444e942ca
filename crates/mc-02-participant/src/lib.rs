//! # Participant Client
//!
//! The interactive side of the multicast system. A participant registers a
//! receiver address with the coordinator, publishes with `msend`, and logs
//! every message delivered to it.
//!
//! ## Architecture
//!
//! - `domain`: session state machine, prompt commands, errors
//! - `adapters`: coordinator client, receiver, message log
//! - `service`: [`ParticipantSession`], which ties them together
//! - `config`: legacy three-line file or TOML

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod service;

pub use adapters::{CoordinatorClient, MessageLog, ReceivedMessage, Receiver};
pub use config::ParticipantConfig;
pub use domain::{ClientState, ParticipantError, Transition, UserCommand};
pub use service::{ParticipantSession, Reply};
