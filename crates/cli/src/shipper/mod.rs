//! Shipping orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Shipper, ShipperConfig};
pub use stats::{DeliveryReport, ShipStats};
