//! # Coordinator Service
//!
//! Implements [`CoordinatorApi`](crate::ports::CoordinatorApi) on top of the
//! participant directory, the message buffer and per-participant delivery
//! lanes.
//!
//! Time comes from the injected `TimeSource`; deliveries go through the
//! injected `DeliveryTransport`.

mod api;
mod core;
mod engine;
mod lane;
mod maintenance;
mod session;

pub use core::Coordinator;
