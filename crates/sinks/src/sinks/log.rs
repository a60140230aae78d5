//! LogSink - logs batch summary via tracing

use contracts::{ByteSink, ContractError};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
    batches: u64,
    bytes: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            bytes: 0,
        }
    }

    fn log_batch_summary(&self, buf: &[u8]) {
        let lines = buf.iter().filter(|b| **b == b'\n').count();

        info!(
            sink = %self.name,
            batch = self.batches,
            bytes = buf.len(),
            lines,
            "Batch received"
        );
    }
}

impl ByteSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, buf),
        fields(sink = %self.name, bytes = buf.len())
    )]
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        self.batches += 1;
        self.bytes += buf.len() as u64;
        self.log_batch_summary(buf);
        Ok(buf.len())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            bytes = self.bytes,
            "LogSink closed"
        );
        Ok(())
    }
}
