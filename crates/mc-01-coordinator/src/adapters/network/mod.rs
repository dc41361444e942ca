//! # Network Adapters
//!
//! ## Adapters Provided
//!
//! - `SystemTimeSource` - wall-clock milliseconds
//! - `StaticConfigProvider` - fixed retention and delivery settings
//! - `NoOpDeliveryTransport` - accepts every delivery without sending it
//! - `TcpDeliveryTransport` - one short-lived TCP connection per delivery
//!   (requires "network" feature)
//! - `CommandListener` - accept loop reading one command line per
//!   connection (requires "network" feature)

/// Configuration providers
pub mod config;
/// Time source adapters
pub mod time;
/// Delivery transports
pub mod transport;

/// Inbound command listener
#[cfg(feature = "network")]
pub mod listener;

pub use config::StaticConfigProvider;
pub use time::SystemTimeSource;
pub use transport::NoOpDeliveryTransport;

#[cfg(feature = "network")]
pub use listener::{CommandListener, ListenerConfig};

#[cfg(feature = "network")]
pub use transport::TcpDeliveryTransport;
