//! # Participant Domain
//!
//! Local session state, the interactive command language and the client's
//! error type. Nothing here touches the network.

pub mod command;
pub mod errors;
pub mod state;

pub use command::UserCommand;
pub use errors::ParticipantError;
pub use state::{ClientState, Transition};
