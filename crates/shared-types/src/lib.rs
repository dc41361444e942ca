//! # Shared Types Crate
//!
//! Identity types and the line protocol spoken between participants and the
//! coordinator.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the coordinator, its runtime and the
//!   participant client all parse and render lines through this crate.
//! - **One line per connection**: every request and every delivery is a
//!   single newline-terminated line; the message body is "rest of line".

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod entities;
pub mod errors;
pub mod protocol;

pub use entities::*;
pub use errors::*;
pub use protocol::*;
