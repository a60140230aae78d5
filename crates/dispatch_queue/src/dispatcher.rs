//! RecordDispatcher - ships every record to a sink as its own queued job

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, instrument};

use contracts::{QueueConfig, RecordSink};

use crate::error::QueueError;
use crate::metrics::QueueMetricsSnapshot;
use crate::queue::DispatchQueue;

/// Sends records through a [`DispatchQueue`], one job per record
///
/// Send failures are logged inside the job and never reach the caller;
/// only backpressure (a full queue) is reported by [`dispatch`](Self::dispatch).
pub struct RecordDispatcher<S> {
    sink: Arc<S>,
    queue: DispatchQueue,
}

impl<S> RecordDispatcher<S>
where
    S: RecordSink + Send + Sync + 'static,
{
    /// Create a dispatcher whose queue is named after the sink
    pub fn new(sink: S, config: &QueueConfig) -> Self {
        let queue = DispatchQueue::with_config(sink.name(), config);
        Self {
            sink: Arc::new(sink),
            queue,
        }
    }

    /// Get the sink
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Get the underlying queue
    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    /// Get current queue metrics
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.queue.metrics()
    }

    /// Queue one record for delivery (non-blocking)
    ///
    /// # Errors
    /// Returns the queue's capacity or closed error; the record is dropped.
    pub fn dispatch(&self, record: impl Into<Bytes>) -> Result<(), QueueError> {
        let sink = Arc::clone(&self.sink);
        let record = record.into();

        self.queue.push(async move {
            let bytes = record.len();
            if let Err(e) = sink.send(record).await {
                error!(sink = %sink.name(), bytes, error = %e, "Record send failed");
            }
        })
    }

    /// Wait until every queued record has been attempted
    pub async fn flush(&self) {
        self.queue.wait().await;
    }

    /// Drain the queue and stop its workers
    #[instrument(name = "record_dispatcher_shutdown", skip(self))]
    pub async fn shutdown(self) {
        self.queue.shutdown().await;
    }
}
