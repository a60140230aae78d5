//! TcpSink - streams batches over a TCP connection

use contracts::{ByteSink, ContractError, SinkConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Default connect timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;
/// Default per-write deadline (milliseconds)
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;

/// Configuration for TcpSink
#[derive(Debug, Clone)]
pub struct TcpSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
    /// How long a single write may block
    pub write_timeout: Duration,
}

impl TcpSinkConfig {
    /// Config with default timeouts
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }

    /// Create config from sink params
    ///
    /// # Errors
    /// Returns a validation error if `addr` is missing or invalid, or a
    /// timeout is not an integer.
    pub fn from_config(config: &SinkConfig) -> Result<Self, ContractError> {
        let addr_str = config.param("addr").ok_or_else(|| {
            ContractError::config_validation("sink.params.addr", "tcp sink requires an addr")
        })?;

        let addr: SocketAddr = addr_str.parse().map_err(|e| {
            ContractError::config_validation(
                "sink.params.addr",
                format!("invalid address '{addr_str}': {e}"),
            )
        })?;

        let connect_timeout_ms = config
            .param_u64("connect_timeout_ms")?
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS);
        let write_timeout_ms = config
            .param_u64("write_timeout_ms")?
            .unwrap_or(DEFAULT_WRITE_TIMEOUT_MS);

        Ok(Self {
            addr,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            write_timeout: Duration::from_millis(write_timeout_ms),
        })
    }
}

/// Sink that writes to a TCP stream, reconnecting after failures
///
/// A failed write drops the connection and returns the error; the next
/// write reconnects first. Retrying is left to the caller.
pub struct TcpSink {
    name: String,
    config: TcpSinkConfig,
    stream: Option<TcpStream>,
}

impl TcpSink {
    /// Create a TcpSink and try to connect
    ///
    /// An unreachable peer is not fatal; the first write retries the
    /// connection.
    #[instrument(name = "tcp_sink_new", skip(name, config), fields(addr = %config.addr))]
    pub async fn new(name: impl Into<String>, config: TcpSinkConfig) -> Self {
        let name = name.into();
        let stream = match connect(&name, &config).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(sink = %name, addr = %config.addr, error = %e, "Couldn't connect, will retry on write");
                None
            }
        };

        Self {
            name,
            config,
            stream,
        }
    }

    /// Create from sink config (for factory)
    pub async fn from_config(config: &SinkConfig) -> Result<Self, ContractError> {
        let tcp_config = TcpSinkConfig::from_config(config)?;
        Ok(Self::new(&config.name, tcp_config).await)
    }

    /// True if a connection is currently held
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn stream(&mut self) -> Result<&mut TcpStream, ContractError> {
        if self.stream.is_none() {
            let stream = connect(&self.name, &self.config).await?;
            debug!(sink = %self.name, addr = %self.config.addr, "Reconnected");
            self.stream = Some(stream);
        }
        self.stream
            .as_mut()
            .ok_or_else(|| ContractError::sink_connection(&self.name, "not connected"))
    }
}

async fn connect(name: &str, config: &TcpSinkConfig) -> Result<TcpStream, ContractError> {
    match timeout(config.connect_timeout, TcpStream::connect(config.addr)).await {
        Ok(Ok(stream)) => {
            stream.set_nodelay(true)?;
            Ok(stream)
        }
        Ok(Err(e)) => Err(ContractError::sink_connection(name, e.to_string())),
        Err(_) => Err(ContractError::sink_timeout(
            name,
            config.connect_timeout.as_millis() as u64,
        )),
    }
}

impl ByteSink for TcpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "tcp_sink_write",
        skip(self, buf),
        fields(sink = %self.name, bytes = buf.len())
    )]
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        let write_timeout = self.config.write_timeout;
        let stream = self.stream().await?;

        let outcome = timeout(write_timeout, stream.write(buf)).await;

        let result = match outcome {
            Ok(Ok(0)) if !buf.is_empty() => Err(ContractError::sink_write(
                &self.name,
                "connection closed by peer",
            )),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(ContractError::sink_write(&self.name, e.to_string())),
            Err(_) => Err(ContractError::sink_timeout(
                &self.name,
                write_timeout.as_millis() as u64,
            )),
        };

        if let Err(e) = &result {
            // Reconnect on the next attempt
            debug!(sink = %self.name, error = %e, "Dropping connection");
            self.stream = None;
        }
        result
    }

    #[instrument(name = "tcp_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(stream) = self.stream.as_mut() {
            stream.flush().await?;
        }
        Ok(())
    }

    #[instrument(name = "tcp_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        debug!(sink = %self.name, "TcpSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_tcp_sink_config_parsing() {
        let config = SinkConfig::new("net", SinkType::Tcp)
            .with_param("addr", "127.0.0.1:9999")
            .with_param("write_timeout_ms", "250");

        let parsed = TcpSinkConfig::from_config(&config).unwrap();
        assert_eq!(parsed.addr.port(), 9999);
        assert_eq!(parsed.write_timeout, Duration::from_millis(250));
        assert_eq!(
            parsed.connect_timeout,
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_tcp_sink_config_rejects_bad_params() {
        let missing = SinkConfig::new("net", SinkType::Tcp);
        assert!(TcpSinkConfig::from_config(&missing).is_err());

        let bad_addr = SinkConfig::new("net", SinkType::Tcp).with_param("addr", "nowhere");
        assert!(TcpSinkConfig::from_config(&bad_addr).is_err());

        let bad_timeout = SinkConfig::new("net", SinkType::Tcp)
            .with_param("addr", "127.0.0.1:9999")
            .with_param("connect_timeout_ms", "soon");
        assert!(TcpSinkConfig::from_config(&bad_timeout).is_err());
    }

    #[tokio::test]
    async fn test_tcp_sink_write() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            socket.read_to_string(&mut received).await.unwrap();
            received
        });

        let mut sink = TcpSink::new("test_tcp", TcpSinkConfig::new(addr)).await;
        assert!(sink.is_connected());

        let mut remaining: &[u8] = b"hello over tcp\n";
        while !remaining.is_empty() {
            let n = sink.write(remaining).await.unwrap();
            remaining = &remaining[n..];
        }
        sink.close().await.unwrap();

        assert_eq!(reader.await.unwrap(), "hello over tcp\n");
    }

    #[tokio::test]
    async fn test_unreachable_peer_errors_then_reconnects() {
        // Reserve a port, then free it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut sink = TcpSink::new("test_tcp", TcpSinkConfig::new(addr)).await;
        assert!(!sink.is_connected());
        assert!(sink.write(b"lost").await.is_err());

        // Peer comes up; the next write reconnects
        let listener = TcpListener::bind(addr).await.unwrap();
        let reader = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let n = sink.write(b"found").await.unwrap();
        assert_eq!(n, 5);
        sink.close().await.unwrap();

        assert_eq!(reader.await.unwrap(), b"found");
    }
}
