//! # Participant Adapters
//!
//! ```text
//!   stdin ──→ ParticipantSession ──CoordinatorClient──→ coordinator
//!                     │
//!                  Receiver ←── deliveries ── coordinator
//!                     │
//!                 MessageLog ──→ log file
//! ```

pub mod client;
pub mod log;
pub mod receiver;

pub use client::CoordinatorClient;
pub use log::{MessageLog, ReceivedMessage};
pub use receiver::Receiver;
