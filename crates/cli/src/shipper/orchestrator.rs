//! Shipper - reads lines and feeds them to the configured delivery component.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use batch_buffer::BatchBuffer;
use bytes::Bytes;
use contracts::{DeliveryMode, RecordSink, ShipperBlueprint};
use dispatch_queue::RecordDispatcher;
use sinks::{create_byte_sink, AnySink, SharedSink};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use super::{DeliveryReport, ShipStats};
use crate::error::CliError;

/// Shipper configuration
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    /// The shipper blueprint configuration
    pub blueprint: ShipperBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main shipping orchestrator
pub struct Shipper {
    config: ShipperConfig,
}

impl Shipper {
    /// Create a new shipper with the given configuration
    pub fn new(config: ShipperConfig) -> Self {
        Self { config }
    }

    /// Ship every line of `input` until end of input or `shutdown` fires,
    /// then drain the delivery component
    ///
    /// # Errors
    /// Fails if the sink can't be created or the input can't be read. A
    /// read error still drains what was already shipped.
    pub async fn run<R, F>(self, input: R, shutdown: F) -> Result<ShipStats>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let sink = create_byte_sink(&blueprint.sink)
            .await
            .map_err(|e| CliError::sink_setup(&blueprint.sink.name, e.to_string()))?;

        info!(
            sink = %blueprint.sink.name,
            sink_type = ?blueprint.sink.sink_type,
            mode = %blueprint.mode,
            "Sink ready"
        );

        let delivery = Delivery::start(blueprint, sink);
        let mut stats = ShipStats::new(blueprint.mode);
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        let read_result = loop {
            let line = tokio::select! {
                line = lines.next_line() => line,
                () = &mut shutdown => {
                    warn!("Received shutdown signal, draining...");
                    stats.interrupted = true;
                    break Ok(());
                }
            };

            match line {
                Ok(Some(line)) => {
                    let mut record = line.into_bytes();
                    record.push(b'\n');
                    stats.record_line(record.len());
                    delivery.ship(Bytes::from(record), &mut stats).await;
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(CliError::from(e)),
            }
        };

        stats.delivery = Some(delivery.drain().await);
        stats.duration = start_time.elapsed();

        read_result?;
        Ok(stats)
    }
}

/// The running delivery component
enum Delivery {
    Batched(BatchBuffer),
    Dispatched(RecordDispatcher<SharedSink<AnySink>>),
}

impl Delivery {
    fn start(blueprint: &ShipperBlueprint, sink: AnySink) -> Self {
        match blueprint.mode {
            DeliveryMode::Batched => Self::Batched(BatchBuffer::spawn(sink, &blueprint.buffer)),
            DeliveryMode::Dispatched => Self::Dispatched(RecordDispatcher::new(
                SharedSink::new(sink),
                &blueprint.queue,
            )),
        }
    }

    async fn ship(&self, record: Bytes, stats: &mut ShipStats) {
        match self {
            Self::Batched(buffer) => buffer.append(record).await,
            Self::Dispatched(dispatcher) => {
                if let Err(e) = dispatcher.dispatch(record) {
                    stats.lines_rejected += 1;
                    debug!(error = %e, "Line dropped");
                }
            }
        }
    }

    async fn drain(self) -> DeliveryReport {
        match self {
            Self::Batched(buffer) => {
                let handle = buffer.handle();
                buffer.close().await;
                DeliveryReport::Batched(handle.metrics())
            }
            Self::Dispatched(dispatcher) => {
                dispatcher.flush().await;
                let metrics = dispatcher.metrics();
                let sink = Arc::clone(dispatcher.sink());
                dispatcher.shutdown().await;

                if let Err(e) = sink.close().await {
                    warn!(sink = %sink.name(), error = %e, "Sink close failed");
                }
                DeliveryReport::Dispatched(metrics)
            }
        }
    }
}
