//! Build sinks from configuration

use contracts::{ByteSink, ContractError, SinkConfig, SinkType};
use tracing::{debug, instrument};

use crate::error::SinkError;
use crate::sinks::{DiscardSink, FileSink, LogSink, MemorySink, TcpSink};

/// Any configured sink, chosen at runtime
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    Tcp(TcpSink),
    Discard(DiscardSink),
    Memory(MemorySink),
}

impl AnySink {
    /// Sink type this variant was built for
    pub fn sink_type(&self) -> SinkType {
        match self {
            Self::Log(_) => SinkType::Log,
            Self::File(_) => SinkType::File,
            Self::Tcp(_) => SinkType::Tcp,
            Self::Discard(_) => SinkType::Discard,
            Self::Memory(_) => SinkType::Memory,
        }
    }
}

impl ByteSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::Log(s) => s.name(),
            Self::File(s) => s.name(),
            Self::Tcp(s) => s.name(),
            Self::Discard(s) => s.name(),
            Self::Memory(s) => s.name(),
        }
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        match self {
            Self::Log(s) => s.write(buf).await,
            Self::File(s) => s.write(buf).await,
            Self::Tcp(s) => s.write(buf).await,
            Self::Discard(s) => s.write(buf).await,
            Self::Memory(s) => s.write(buf).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.flush().await,
            Self::File(s) => s.flush().await,
            Self::Tcp(s) => s.flush().await,
            Self::Discard(s) => s.flush().await,
            Self::Memory(s) => s.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.close().await,
            Self::File(s) => s.close().await,
            Self::Tcp(s) => s.close().await,
            Self::Discard(s) => s.close().await,
            Self::Memory(s) => s.close().await,
        }
    }
}

impl From<MemorySink> for AnySink {
    fn from(sink: MemorySink) -> Self {
        Self::Memory(sink)
    }
}

/// Create a sink from configuration
///
/// # Errors
/// Returns [`SinkError`] if params are invalid or the file can't be opened.
/// An unreachable TCP peer is not an error; the sink reconnects on write.
#[instrument(
    name = "sinks_create_byte_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_byte_sink(config: &SinkConfig) -> Result<AnySink, SinkError> {
    let sink = match config.sink_type {
        SinkType::Log => AnySink::Log(LogSink::new(&config.name)),
        SinkType::Discard => AnySink::Discard(DiscardSink::new(&config.name)),
        SinkType::Memory => AnySink::Memory(MemorySink::new(&config.name)),
        SinkType::File => AnySink::File(
            FileSink::from_config(config)
                .await
                .map_err(|e| SinkError::creation(&config.name, e.to_string()))?,
        ),
        SinkType::Tcp => AnySink::Tcp(
            TcpSink::from_config(config)
                .await
                .map_err(|e| SinkError::creation(&config.name, e.to_string()))?,
        ),
    };

    debug!(sink = %config.name, sink_type = ?config.sink_type, "Sink created");
    Ok(sink)
}
