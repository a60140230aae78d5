//! # Sinks
//!
//! Concrete delivery destinations.
//!
//! Responsibilities:
//! - `ByteSink` implementations for the Batching Buffer write loop
//! - `SharedSink` adapter so the same sinks serve Dispatch Queue jobs
//! - Build a sink from a `SinkConfig`

pub mod error;
pub mod factory;
mod shared;
mod sinks;

pub use contracts::{ByteSink, RecordSink};
pub use error::SinkError;
pub use factory::{create_byte_sink, AnySink};
pub use shared::SharedSink;
pub use sinks::{
    DiscardSink, FileSink, FileSinkConfig, LogSink, MemorySink, TcpSink, TcpSinkConfig,
};
