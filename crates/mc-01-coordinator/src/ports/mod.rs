//! # Ports Layer
//!
//! - `inbound`: the API the coordinator exposes to its transport shim
//! - `outbound`: what the coordinator requires from its host (delivery,
//!   clock, configuration, metrics)

pub mod inbound;
pub mod outbound;

pub use inbound::CoordinatorApi;
pub use outbound::{
    ConfigProvider, CoordinatorMetrics, DeliveryError, DeliveryTransport, NoOpMetrics, TimeSource,
};
