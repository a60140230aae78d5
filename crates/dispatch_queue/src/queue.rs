//! DispatchQueue - bounded mailbox drained by a fixed pool of worker tasks

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace};

use contracts::QueueConfig;
use observability::metrics::{record_job_completed, record_job_pushed, record_queue_pending};

use crate::error::QueueError;
use crate::metrics::{QueueMetrics, QueueMetricsSnapshot};

/// A unit of work: a boxed future with nothing to return
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Name used when the caller does not provide one
const DEFAULT_QUEUE_NAME: &str = "dispatch";

/// Queue that never blocks the producer
///
/// `capacity` bounds the jobs accepted and not yet finished, whether they
/// wait in the mailbox or are running. Once that many are outstanding new
/// jobs are rejected with [`QueueError::AtCapacity`] until one completes.
///
/// Exactly `concurrency` workers are spawned, so at most
/// `min(concurrency, capacity)` jobs run at once.
pub struct DispatchQueue {
    /// Queue name (logs/metrics)
    name: String,
    /// Resolved mailbox capacity
    capacity: usize,
    /// Mailbox sender
    tx: Sender<Job>,
    /// Jobs accepted and not yet finished
    pending: Arc<watch::Sender<usize>>,
    /// Shared metrics
    metrics: Arc<QueueMetrics>,
    /// Worker task handles
    workers: Vec<JoinHandle<()>>,
}

impl DispatchQueue {
    /// Create a queue with the given mailbox capacity and worker count
    ///
    /// Zero values fall back to the `QueueConfig` defaults.
    pub fn new(capacity: usize, concurrency: usize) -> Self {
        Self::with_config(DEFAULT_QUEUE_NAME, &QueueConfig::new(capacity, concurrency))
    }

    /// Create a named queue from configuration and spawn its workers
    #[instrument(name = "dispatch_queue_new", skip(name, config), fields(queue = %name.as_ref()))]
    pub fn with_config(name: impl AsRef<str>, config: &QueueConfig) -> Self {
        let name = name.as_ref().to_string();
        let config = config.resolved();
        let (tx, rx) = bounded(config.capacity);
        let (pending, _) = watch::channel(0usize);
        let pending = Arc::new(pending);
        let metrics = Arc::new(QueueMetrics::new());

        let workers = (0..config.concurrency)
            .map(|id| {
                let rx = rx.clone();
                let pending = Arc::clone(&pending);
                let metrics = Arc::clone(&metrics);
                let name = name.clone();
                tokio::spawn(async move {
                    queue_worker(id, rx, pending, metrics, name).await;
                })
            })
            .collect();

        debug!(
            queue = %name,
            capacity = config.capacity,
            concurrency = config.concurrency,
            "Dispatch queue started"
        );

        Self {
            name,
            capacity: config.capacity,
            tx,
            pending,
            metrics,
            workers,
        }
    }

    /// Get queue name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get mailbox capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get worker count
    pub fn concurrency(&self) -> usize {
        self.workers.len()
    }

    /// Jobs accepted and not yet finished
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Get current metrics
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.metrics.snapshot(self.pending())
    }

    /// Push a job into the queue (non-blocking)
    ///
    /// # Errors
    /// - [`QueueError::AtCapacity`] if `capacity` jobs are still outstanding
    /// - [`QueueError::Closed`] if the queue was closed
    pub fn push<F>(&self, job: F) -> Result<(), QueueError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.tx.is_closed() {
            self.metrics.inc_rejected_count();
            record_job_pushed(&self.name, false);
            debug!(queue = %self.name, "Queue closed, job dropped");
            return Err(QueueError::closed(&self.name));
        }

        // Admit and count in one step so `wait` can never observe zero while
        // an accepted job is still in flight.
        let capacity = self.capacity;
        let admitted = self.pending.send_if_modified(|n| {
            if *n >= capacity {
                return false;
            }
            *n += 1;
            true
        });
        if !admitted {
            self.metrics.inc_rejected_count();
            record_job_pushed(&self.name, false);
            trace!(queue = %self.name, "Queue at capacity, job dropped");
            return Err(QueueError::at_capacity(&self.name, self.capacity));
        }

        // The mailbox holds `capacity` jobs, so only a close can fail here
        match self.tx.try_send(Box::pin(job)) {
            Ok(()) => {
                self.metrics.inc_accepted_count();
                record_job_pushed(&self.name, true);
                record_queue_pending(&self.name, self.pending());
                trace!(queue = %self.name, "Job queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.release();
                record_job_pushed(&self.name, false);
                trace!(queue = %self.name, "Queue full, job dropped");
                Err(QueueError::at_capacity(&self.name, self.capacity))
            }
            Err(TrySendError::Closed(_)) => {
                self.release();
                record_job_pushed(&self.name, false);
                debug!(queue = %self.name, "Queue closed, job dropped");
                Err(QueueError::closed(&self.name))
            }
        }
    }

    /// Wait until every accepted job has finished
    ///
    /// Jobs pushed while waiting are included if they are accepted before
    /// the pending count is observed at zero.
    pub async fn wait(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so this only fails if it was dropped.
        let _ = rx.wait_for(|pending| *pending == 0).await;
    }

    /// Stop accepting jobs
    ///
    /// Jobs already in the mailbox still run.
    pub fn close(&self) {
        self.tx.close();
    }

    /// Whether the queue stopped accepting jobs
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close the mailbox, let workers drain it and join them
    #[instrument(name = "dispatch_queue_shutdown", skip(self), fields(queue = %self.name))]
    pub async fn shutdown(self) {
        self.tx.close();
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(queue = %self.name, error = ?e, "Worker task panicked");
            }
        }
        debug!(queue = %self.name, "Dispatch queue shutdown complete");
    }

    fn release(&self) {
        self.metrics.inc_rejected_count();
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Worker task that pulls jobs off the shared mailbox one at a time
async fn queue_worker(
    id: usize,
    rx: Receiver<Job>,
    pending: Arc<watch::Sender<usize>>,
    metrics: Arc<QueueMetrics>,
    name: String,
) {
    debug!(queue = %name, worker = id, "Queue worker started");

    while let Ok(job) = rx.recv().await {
        // Each job runs in its own task so a panic cannot take the worker down.
        let panicked = match tokio::spawn(job).await {
            Ok(()) => {
                metrics.inc_completed_count();
                false
            }
            Err(e) => {
                metrics.inc_panicked_count();
                error!(queue = %name, worker = id, error = %e, "Job panicked");
                true
            }
        };
        record_job_completed(&name, panicked);

        pending.send_modify(|n| *n = n.saturating_sub(1));
        record_queue_pending(&name, *pending.borrow());
    }

    debug!(queue = %name, worker = id, "Queue worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::{mpsc, Barrier, Semaphore};
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test]
    async fn test_push_and_wait() {
        let queue = DispatchQueue::new(10, 2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            queue
                .push(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        queue.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(queue.pending(), 0);

        let metrics = queue.metrics();
        assert_eq!(metrics.accepted_count, 5);
        assert_eq!(metrics.completed_count, 5);
        assert_eq!(metrics.rejected_count, 0);
    }

    #[tokio::test]
    async fn test_wait_without_jobs_returns_immediately() {
        let queue = DispatchQueue::new(1, 1);
        timeout(Duration::from_millis(100), queue.wait())
            .await
            .expect("wait on an idle queue should not block");
    }

    #[tokio::test]
    async fn test_wait_blocks_until_jobs_finish() {
        let queue = DispatchQueue::new(4, 1);
        let done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&done);
        queue
            .push(async move {
                sleep(Duration::from_millis(50)).await;
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();

        queue.wait().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_non_blocking_writes() {
        let queue = DispatchQueue::new(1, 1);
        let gate = Arc::new(Semaphore::new(0));
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();

        let blocked_job = || {
            let gate = Arc::clone(&gate);
            let started_tx = started_tx.clone();
            async move {
                let _ = started_tx.send(());
                gate.acquire().await.unwrap().forget();
            }
        };

        // First job occupies the only worker and the only slot.
        queue.push(blocked_job()).unwrap();
        started_rx.recv().await.unwrap();

        // Everything else is rejected without blocking.
        for _ in 0..3 {
            let err = timeout(Duration::from_millis(100), async { queue.push(blocked_job()) })
                .await
                .expect("push should not block")
                .unwrap_err();
            assert!(err.is_capacity());
        }

        // Unblock the first job; its slot frees up.
        gate.add_permits(1);
        queue.wait().await;

        // Should work again
        queue.push(blocked_job()).unwrap();
        started_rx.recv().await.unwrap();

        gate.add_permits(1);
        queue.wait().await;

        let metrics = queue.metrics();
        assert_eq!(metrics.accepted_count, 2);
        assert_eq!(metrics.rejected_count, 3);
        assert_eq!(metrics.completed_count, 2);
    }

    #[tokio::test]
    async fn test_queued_jobs_count_against_capacity() {
        let queue = DispatchQueue::new(2, 1);
        let gate = Arc::new(Semaphore::new(0));

        // Rejected whether or not the worker has dequeued anything yet
        for _ in 0..2 {
            let gate = Arc::clone(&gate);
            queue
                .push(async move {
                    gate.acquire().await.unwrap().forget();
                })
                .unwrap();
        }
        assert!(queue.push(async {}).unwrap_err().is_capacity());
        assert_eq!(queue.pending(), 2);

        gate.add_permits(2);
        queue.wait().await;
        assert_eq!(queue.metrics().rejected_count, 1);
    }

    #[tokio::test]
    async fn test_capacity_error_carries_context() {
        let queue = DispatchQueue::with_config("papertrail", &QueueConfig::new(1, 1));
        let gate = Arc::new(Semaphore::new(0));

        // One outstanding job fills a queue of capacity 1.
        let mut last_error = None;
        for _ in 0..5 {
            let gate = Arc::clone(&gate);
            if let Err(e) = queue.push(async move {
                gate.acquire().await.unwrap().forget();
            }) {
                last_error = Some(e);
            }
        }

        assert_eq!(last_error, Some(QueueError::at_capacity("papertrail", 1)));

        gate.add_permits(5);
        queue.wait().await;
    }

    #[tokio::test]
    async fn test_workers_run_concurrently() {
        let queue = DispatchQueue::new(3, 3);
        let barrier = Arc::new(Barrier::new(3));

        for _ in 0..3 {
            let barrier = Arc::clone(&barrier);
            queue
                .push(async move {
                    barrier.wait().await;
                })
                .unwrap();
        }

        timeout(Duration::from_secs(1), queue.wait())
            .await
            .expect("three workers should meet at the barrier");
        assert_eq!(queue.concurrency(), 3);
    }

    #[tokio::test]
    async fn test_in_flight_bounded_by_concurrency() {
        let queue = DispatchQueue::new(10, 2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            queue
                .push(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        queue.wait().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_job_is_isolated() {
        let queue = DispatchQueue::new(4, 1);
        let ran = Arc::new(AtomicBool::new(false));

        queue.push(async { panic!("job blew up") }).unwrap();

        let flag = Arc::clone(&ran);
        queue
            .push(async move {
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();

        queue.wait().await;
        assert!(ran.load(Ordering::SeqCst));

        let metrics = queue.metrics();
        assert_eq!(metrics.panicked_count, 1);
        assert_eq!(metrics.completed_count, 1);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_jobs() {
        let queue = DispatchQueue::new(4, 1);
        queue.close();
        assert!(queue.is_closed());

        let err = queue.push(async {}).unwrap_err();
        assert_eq!(err, QueueError::closed(DEFAULT_QUEUE_NAME));
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_mailbox() {
        let queue = DispatchQueue::new(8, 1);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            queue
                .push(async move {
                    sleep(Duration::from_millis(5)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        queue.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_zero_config_uses_defaults() {
        let queue = DispatchQueue::new(0, 0);
        assert_eq!(queue.capacity(), 20);
        assert_eq!(queue.concurrency(), 1);
    }
}
