//! # Contracts
//!
//! Interface contracts shared by every logship crate: sink traits,
//! delivery configuration and the unified error type.
//! Business crates depend on this crate, never the other way around.
//!
//! ## Delivery model
//! - `ByteSink` receives coalesced batches from the Batching Buffer and may
//!   accept only a prefix of each write
//! - `RecordSink` receives one record per call from Dispatch Queue jobs

mod blueprint;
mod delivery_config;
mod error;
mod sink;

pub use blueprint::*;
pub use delivery_config::*;
pub use error::*;
pub use sink::*;
