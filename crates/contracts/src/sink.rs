//! Sink traits - delivery output interfaces
//!
//! Defines the abstract interface for the external destinations that
//! delivered data ends up in.

use bytes::Bytes;

use crate::ContractError;

/// Byte stream output trait, fed by the Batching Buffer write loop
///
/// A sink is owned by exactly one write loop, so `write` takes `&mut self`.
#[trait_variant::make(ByteSink: Send)]
pub trait LocalByteSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write as much of `buf` as the sink accepts
    ///
    /// Returns the number of bytes consumed, which may be less than
    /// `buf.len()`. The caller retries with the remaining suffix, so
    /// implementations must not retain `buf` beyond the call.
    ///
    /// # Errors
    /// Returns write error (should include context). An error means
    /// nothing was consumed.
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Per-record output trait, called from Dispatch Queue jobs
///
/// Takes `&self` so a single sink can be shared by every worker.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one record as its own unit of work
    ///
    /// # Errors
    /// Returns send error (should include context)
    async fn send(&self, record: Bytes) -> Result<(), ContractError>;
}
