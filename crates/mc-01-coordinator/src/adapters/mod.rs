//! # Adapters
//!
//! Concrete implementations of the outbound ports plus the TCP command
//! listener that drives the inbound API.
//!
//! - `SystemTimeSource`, `StaticConfigProvider`, `NoOpDeliveryTransport`
//!   are always available
//! - `TcpDeliveryTransport` and `CommandListener` require the `network`
//!   feature

pub mod network;

pub use network::*;
