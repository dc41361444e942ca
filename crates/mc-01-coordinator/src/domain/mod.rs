//! Domain Layer - Pure coordinator state with no I/O
//!
//! This module contains:
//! - Participant and message entities
//! - Time and stamp value objects, retention window predicate
//! - Participant directory (concurrency-safe keyed store)
//! - Message buffer (append-only, time-ordered, lazily scanned)
//! - Delivery, fan-out and replay reports

pub mod buffer;
pub mod directory;
pub mod entities;
pub mod errors;
pub mod reports;
pub mod value_objects;

pub use buffer::*;
pub use directory::*;
pub use entities::*;
pub use errors::*;
pub use reports::*;
pub use value_objects::*;
