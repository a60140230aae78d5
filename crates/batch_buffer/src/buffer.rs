//! BatchBuffer - coalesces appends and hands batches to the write loop

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use contracts::{BufferConfig, ByteSink};
use observability::metrics::{self as telemetry, FlushTrigger};

use crate::command::{Command, FlushRequest};
use crate::error::BufferError;
use crate::metrics::{BufferMetrics, BufferMetricsSnapshot};
use crate::writer::write_loop;

/// Cloneable producer side of a [`BatchBuffer`]
///
/// Appends only ever wait for the command loop to take the bytes, never for
/// the sink.
#[derive(Debug, Clone)]
pub struct BufferHandle {
    name: Arc<str>,
    commands: mpsc::Sender<Command>,
    metrics: Arc<BufferMetrics>,
}

impl BufferHandle {
    /// Buffer name (the sink's name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append bytes to the accumulator
    ///
    /// Data appended after close is discarded.
    pub async fn append(&self, data: impl Into<Bytes>) {
        if self.commands.send(Command::Append(data.into())).await.is_err() {
            self.metrics.inc_discarded_appends();
            debug!(buffer = %self.name, "Buffer closed, append discarded");
        }
    }

    /// Append without waiting for the command loop
    ///
    /// Returns true if accepted, false if the command channel had no slack
    /// or the buffer is closed (data dropped).
    pub fn try_append(&self, data: impl Into<Bytes>) -> bool {
        match self.commands.try_send(Command::Append(data.into())) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.metrics.inc_discarded_appends();
                warn!(buffer = %self.name, "Command channel full, append dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.inc_discarded_appends();
                debug!(buffer = %self.name, "Buffer closed, append discarded");
                false
            }
        }
    }

    /// Flush the accumulator and wait until the write loop attempted it
    ///
    /// Flushes queued earlier are attempted first. Waits for room in the
    /// flush queue instead of dropping.
    ///
    /// # Errors
    /// Returns [`BufferError::Closed`] if the buffer has been closed.
    pub async fn flush(&self) -> Result<(), BufferError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(done_tx))
            .await
            .map_err(|_| BufferError::closed(&*self.name))?;
        done_rx.await.map_err(|_| BufferError::closed(&*self.name))
    }

    /// Get snapshot of the buffer metrics
    pub fn metrics(&self) -> BufferMetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Batching buffer in front of a single [`ByteSink`]
///
/// Owns the two background tasks. Dropping it without [`close`] leaves the
/// tasks to drain once every [`BufferHandle`] is gone.
///
/// [`close`]: BatchBuffer::close
pub struct BatchBuffer {
    handle: BufferHandle,
    command_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl BatchBuffer {
    /// Spawn a buffer with default settings
    pub fn new<S: ByteSink + 'static>(sink: S) -> Self {
        Self::spawn(sink, &BufferConfig::default())
    }

    /// Spawn the command and write loops for `sink`
    ///
    /// Zero-valued config fields fall back to their defaults.
    #[instrument(name = "batch_buffer_spawn", skip(sink, config), fields(sink = sink.name()))]
    pub fn spawn<S: ByteSink + 'static>(sink: S, config: &BufferConfig) -> Self {
        let config = config.resolved();
        let name = sink.name().to_string();
        let metrics = Arc::new(BufferMetrics::new());

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (flush_tx, flush_rx) = mpsc::channel(config.pending_flushes);

        let write_task = tokio::spawn(write_loop(
            sink,
            flush_rx,
            config.write_retries,
            Arc::clone(&metrics),
            name.clone(),
        ));

        let command_loop = CommandLoop {
            name: name.clone(),
            threshold: config.buffer_size,
            accumulator: BytesMut::with_capacity(config.buffer_size),
            flushes: flush_tx,
            metrics: Arc::clone(&metrics),
        };
        let command_task = tokio::spawn(command_loop.run(command_rx, config.idle_timeout()));

        debug!(
            buffer = %name,
            buffer_size = config.buffer_size,
            idle_timeout_ms = config.idle_timeout_ms,
            pending_flushes = config.pending_flushes,
            write_retries = config.write_retries,
            "Batch buffer started"
        );

        Self {
            handle: BufferHandle {
                name: name.into(),
                commands: command_tx,
                metrics,
            },
            command_task,
            write_task,
        }
    }

    /// Buffer name (the sink's name)
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Producer handle that can be cloned across tasks
    pub fn handle(&self) -> BufferHandle {
        self.handle.clone()
    }

    /// See [`BufferHandle::append`]
    pub async fn append(&self, data: impl Into<Bytes>) {
        self.handle.append(data).await;
    }

    /// See [`BufferHandle::try_append`]
    pub fn try_append(&self, data: impl Into<Bytes>) -> bool {
        self.handle.try_append(data)
    }

    /// See [`BufferHandle::flush`]
    pub async fn flush(&self) -> Result<(), BufferError> {
        self.handle.flush().await
    }

    /// Get snapshot of the buffer metrics
    pub fn metrics(&self) -> BufferMetricsSnapshot {
        self.handle.metrics()
    }

    /// Hand off remaining data, wait for it to be attempted, close the sink
    ///
    /// Outstanding handles stay valid but their appends are discarded.
    #[instrument(name = "batch_buffer_close", skip(self), fields(buffer = %self.handle.name))]
    pub async fn close(self) {
        let Self {
            handle,
            command_task,
            write_task,
        } = self;

        if handle.commands.send(Command::Shutdown).await.is_err() {
            debug!(buffer = %handle.name, "Command loop already stopped");
        }

        if let Err(e) = command_task.await {
            error!(buffer = %handle.name, error = ?e, "Command loop panicked");
        }
        if let Err(e) = write_task.await {
            error!(buffer = %handle.name, error = ?e, "Write loop panicked");
        }

        debug!(buffer = %handle.name, "Batch buffer closed");
    }
}

/// State owned by the command loop task
struct CommandLoop {
    name: String,
    threshold: usize,
    accumulator: BytesMut,
    flushes: mpsc::Sender<FlushRequest>,
    metrics: Arc<BufferMetrics>,
}

impl CommandLoop {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, idle_timeout: Duration) {
        loop {
            // Any command restarts the idle timer
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Append(data)) => self.append(data),
                    Some(Command::Flush(done)) => self.flush(done).await,
                    Some(Command::Shutdown) | None => break,
                },
                () = sleep(idle_timeout) => self.idle_flush(),
            }
        }

        self.drain().await;
        debug!(buffer = %self.name, "Command loop stopped");
    }

    fn append(&mut self, data: Bytes) {
        self.accumulator.extend_from_slice(&data);
        self.metrics.add_appended_bytes(data.len());
        telemetry::record_append(&self.name, data.len());

        if self.accumulator.len() >= self.threshold {
            let payload = self.take();
            self.hand_off_or_drop(payload);
        }
    }

    /// Size-triggered flush; never waits for the write loop
    fn hand_off_or_drop(&mut self, payload: Bytes) {
        let bytes = payload.len();
        match self.flushes.try_send(FlushRequest::new(payload)) {
            Ok(()) => self.record_flush(FlushTrigger::Size, bytes),
            Err(TrySendError::Full(_)) => {
                self.metrics.inc_dropped_flush_count();
                telemetry::record_flush_dropped(&self.name, FlushTrigger::Size, bytes);
                warn!(buffer = %self.name, bytes, "Write loop backed up, flush dropped");
            }
            Err(TrySendError::Closed(_)) => {
                error!(buffer = %self.name, bytes, "Write loop stopped unexpectedly, flush dropped");
            }
        }
    }

    /// Idle flush; keeps the data for the next trigger if the queue is full
    fn idle_flush(&mut self) {
        if self.accumulator.is_empty() {
            return;
        }

        match self.flushes.try_reserve() {
            Ok(permit) => {
                // The permit borrows `flushes`; split the accumulator field directly
                let payload = self.accumulator.split().freeze();
                let bytes = payload.len();
                permit.send(FlushRequest::new(payload));
                self.record_flush(FlushTrigger::Idle, bytes);
            }
            Err(TrySendError::Full(())) => {
                self.metrics.inc_deferred_idle_flush_count();
                debug!(
                    buffer = %self.name,
                    bytes = self.accumulator.len(),
                    "Write loop backed up, idle flush deferred"
                );
            }
            Err(TrySendError::Closed(())) => {
                error!(buffer = %self.name, "Write loop stopped unexpectedly");
            }
        }
    }

    /// Explicit flush; waits for room so the caller's data is never dropped
    async fn flush(&mut self, done: oneshot::Sender<()>) {
        let payload = self.take();
        let bytes = payload.len();
        if self
            .flushes
            .send(FlushRequest::with_ack(payload, done))
            .await
            .is_err()
        {
            // Dropping `done` fails the caller's flush
            error!(buffer = %self.name, bytes, "Write loop stopped unexpectedly, flush lost");
            return;
        }
        self.record_flush(FlushTrigger::Explicit, bytes);
    }

    /// Terminal flush; dropping `self.flushes` afterwards stops the write loop
    async fn drain(&mut self) {
        if self.accumulator.is_empty() {
            return;
        }

        let payload = self.take();
        let bytes = payload.len();
        if self.flushes.send(FlushRequest::new(payload)).await.is_err() {
            error!(buffer = %self.name, bytes, "Write loop stopped unexpectedly, final flush lost");
            return;
        }
        self.record_flush(FlushTrigger::Close, bytes);
    }

    fn take(&mut self) -> Bytes {
        self.accumulator.split().freeze()
    }

    fn record_flush(&self, trigger: FlushTrigger, bytes: usize) {
        self.metrics.inc_flush_count();
        telemetry::record_flush(&self.name, trigger, bytes);
    }
}
