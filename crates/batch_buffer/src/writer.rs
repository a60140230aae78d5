//! Write loop - sole owner of the sink

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, instrument, trace, warn};

use contracts::ByteSink;
use observability::metrics as telemetry;

use crate::command::FlushRequest;
use crate::metrics::BufferMetrics;

/// Result of pushing one flush payload through the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    /// Every byte was consumed
    Delivered { attempts: usize },
    /// Retry budget ran out with bytes left over
    Abandoned {
        attempts: usize,
        unwritten: usize,
        last_error: Option<String>,
    },
}

/// Consume flush requests in order until the command loop goes away
#[instrument(
    name = "buffer_write_loop",
    skip(sink, requests, metrics),
    fields(buffer = %name)
)]
pub(crate) async fn write_loop<S: ByteSink>(
    mut sink: S,
    mut requests: mpsc::Receiver<FlushRequest>,
    write_retries: usize,
    metrics: Arc<BufferMetrics>,
    name: String,
) {
    debug!(buffer = %name, "Write loop started");

    while let Some(FlushRequest { payload, ack }) = requests.recv().await {
        if !payload.is_empty() {
            match write_with_retries(&mut sink, &payload, write_retries).await {
                WriteOutcome::Delivered { attempts } => {
                    metrics.record_delivered(payload.len(), attempts);
                    telemetry::record_batch_delivered(&name, payload.len(), attempts);
                    trace!(buffer = %name, bytes = payload.len(), attempts, "Batch delivered");
                }
                WriteOutcome::Abandoned {
                    attempts,
                    unwritten,
                    last_error,
                } => {
                    metrics.record_abandoned(payload.len() - unwritten, attempts);
                    telemetry::record_batch_abandoned(&name, unwritten);
                    warn!(
                        buffer = %name,
                        bytes = payload.len(),
                        unwritten,
                        attempts,
                        error = last_error.as_deref().unwrap_or("short write"),
                        "Retries exhausted, batch abandoned"
                    );
                }
            }
        }

        if let Some(ack) = ack {
            // Flusher may have given up waiting
            let _ = ack.send(());
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(buffer = %name, error = %e, "Sink flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(buffer = %name, error = %e, "Sink close failed on shutdown");
    }

    debug!(buffer = %name, "Write loop stopped");
}

/// Write `payload` to `sink`, resuming after partial writes
///
/// Every call to the sink that doesn't finish the payload (an error or a
/// short write) spends one unit of `write_retries`.
pub(crate) async fn write_with_retries<S: ByteSink>(
    sink: &mut S,
    payload: &[u8],
    write_retries: usize,
) -> WriteOutcome {
    let mut remaining = payload;
    let mut budget = write_retries.max(1);
    let mut attempts = 0;
    let mut last_error = None;

    while !remaining.is_empty() {
        attempts += 1;
        match sink.write(remaining).await {
            Ok(n) if n >= remaining.len() => {
                return WriteOutcome::Delivered { attempts };
            }
            Ok(n) => {
                remaining = &remaining[n..];
                trace!(
                    sink = sink.name(),
                    written = n,
                    remaining = remaining.len(),
                    "Short write"
                );
            }
            Err(e) => {
                debug!(sink = sink.name(), attempt = attempts, error = %e, "Write failed");
                last_error = Some(e.to_string());
            }
        }

        budget -= 1;
        if budget == 0 {
            return WriteOutcome::Abandoned {
                attempts,
                unwritten: remaining.len(),
                last_error,
            };
        }
    }

    WriteOutcome::Delivered { attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_sinks::{Behavior, TestSink};
    use bytes::Bytes;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_clean_write_takes_one_attempt() {
        let mut sink = TestSink::new(Behavior::Accept);
        let outcome = write_with_retries(&mut sink, b"hello", 3).await;

        assert_eq!(outcome, WriteOutcome::Delivered { attempts: 1 });
        assert_eq!(sink.contents(), "hello");
    }

    #[tokio::test]
    async fn test_short_writes_resume_from_remaining_suffix() {
        let mut sink = TestSink::new(Behavior::Leaky);
        let outcome = write_with_retries(&mut sink, b"abcd", 3).await;

        // "ab" then "cd"
        assert_eq!(outcome, WriteOutcome::Delivered { attempts: 2 });
        assert_eq!(sink.contents(), "abcd");
    }

    #[tokio::test]
    async fn test_errors_exhaust_budget() {
        let mut sink = TestSink::new(Behavior::Unavailable);
        let outcome = write_with_retries(&mut sink, b"abc", 3).await;

        match outcome {
            WriteOutcome::Abandoned {
                attempts,
                unwritten,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(unwritten, 3);
                assert!(last_error.is_some());
            }
            other => panic!("expected abandon, got {other:?}"),
        }
        assert_eq!(sink.write_calls(), 3);
    }

    #[tokio::test]
    async fn test_short_writes_count_against_budget() {
        let mut sink = TestSink::new(Behavior::OneByte);
        let outcome = write_with_retries(&mut sink, b"abcde", 3).await;

        assert_eq!(
            outcome,
            WriteOutcome::Abandoned {
                attempts: 3,
                unwritten: 2,
                last_error: None,
            }
        );
        assert_eq!(sink.contents(), "abc");
    }

    #[tokio::test]
    async fn test_write_loop_acks_and_closes_sink() {
        let sink = TestSink::new(Behavior::Accept);
        let probe = sink.clone();
        let metrics = Arc::new(BufferMetrics::new());
        let (tx, rx) = mpsc::channel(4);

        let handle = tokio::spawn(write_loop(
            sink,
            rx,
            3,
            Arc::clone(&metrics),
            "test".to_string(),
        ));

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(FlushRequest::new(Bytes::from_static(b"one ")))
            .await
            .unwrap();
        tx.send(FlushRequest::with_ack(Bytes::from_static(b"two"), ack_tx))
            .await
            .unwrap();
        ack_rx.await.unwrap();

        assert_eq!(probe.contents(), "one two");
        assert!(!probe.is_closed());

        drop(tx);
        handle.await.unwrap();

        assert!(probe.is_closed());
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered_batches, 2);
        assert_eq!(snapshot.written_bytes, 7);
    }
}
