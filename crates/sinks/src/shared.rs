//! SharedSink - lets Dispatch Queue workers share one ByteSink

use bytes::Bytes;
use contracts::{ByteSink, ContractError, RecordSink};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Default number of write calls per record before giving up
pub const DEFAULT_RECORD_ATTEMPTS: usize = 3;

/// Adapter turning a [`ByteSink`] into a [`RecordSink`]
///
/// Workers take turns on the inner sink; each record is written whole or
/// reported as failed.
pub struct SharedSink<S> {
    name: String,
    attempts: usize,
    inner: Mutex<S>,
}

impl<S: ByteSink> SharedSink<S> {
    /// Wrap a sink with the default attempt budget
    pub fn new(sink: S) -> Self {
        Self::with_attempts(sink, DEFAULT_RECORD_ATTEMPTS)
    }

    /// Wrap a sink, allowing `attempts` write calls per record
    pub fn with_attempts(sink: S, attempts: usize) -> Self {
        Self {
            name: sink.name().to_string(),
            attempts: attempts.max(1),
            inner: Mutex::new(sink),
        }
    }

    /// Flush and close the inner sink
    #[instrument(name = "shared_sink_close", skip(self), fields(sink = %self.name))]
    pub async fn close(&self) -> Result<(), ContractError> {
        let mut sink = self.inner.lock().await;
        sink.flush().await?;
        sink.close().await
    }

    /// Unwrap the inner sink
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

impl<S: ByteSink + Send> RecordSink for SharedSink<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, record: Bytes) -> Result<(), ContractError> {
        let mut sink = self.inner.lock().await;
        let mut remaining = &record[..];
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match sink.write(remaining).await {
                Ok(n) if n >= remaining.len() => return Ok(()),
                Ok(n) => remaining = &remaining[n..],
                Err(e) => {
                    debug!(sink = %self.name, attempt, error = %e, "Record write failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ContractError::sink_write(
                &self.name,
                format!("{} bytes left after {} attempts", remaining.len(), self.attempts),
            )
        }))
    }
}
