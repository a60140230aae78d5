//! Sink implementations
//!
//! Contains MemorySink, LogSink, DiscardSink, FileSink, and TcpSink.

mod discard;
mod file;
mod log;
mod memory;
mod tcp;

pub use self::discard::DiscardSink;
pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::tcp::{TcpSink, TcpSinkConfig};
