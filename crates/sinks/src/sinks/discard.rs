//! DiscardSink - accepts and drops everything

use contracts::{ByteSink, ContractError};
use tracing::debug;

/// Sink that discards all data, counting what it swallowed
pub struct DiscardSink {
    name: String,
    discarded_bytes: u64,
}

impl DiscardSink {
    /// Create a new DiscardSink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discarded_bytes: 0,
        }
    }

    /// Bytes accepted so far
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }
}

impl ByteSink for DiscardSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        self.discarded_bytes += buf.len() as u64;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, bytes = self.discarded_bytes, "DiscardSink closed");
        Ok(())
    }
}
