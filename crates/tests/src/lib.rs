//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Configuration contracts (file format to blueprint)
//! - Config -> sink factory -> Batching Buffer / Dispatch Queue -> destination
//! - Producer isolation from dead or slow destinations

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DeliveryMode, SinkType, DEFAULT_PENDING_FLUSHES};

    #[test]
    fn test_documented_config_loads() {
        let content = r#"
mode = "batched"
[buffer]
buffer_size = 4096
idle_timeout_ms = 2000
[queue]
capacity = 20
concurrency = 2
[sink]
name = "main"
sink_type = "file"
[sink.params]
path = "./out.log"
"#;

        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.mode, DeliveryMode::Batched);
        assert_eq!(blueprint.buffer.buffer_size, 4096);
        assert_eq!(blueprint.buffer.pending_flushes, DEFAULT_PENDING_FLUSHES);
        assert_eq!(blueprint.queue.concurrency, 2);
        assert_eq!(blueprint.sink.sink_type, SinkType::File);
        assert_eq!(blueprint.sink.param("path"), Some("./out.log"));
    }

    #[test]
    fn test_toml_and_json_agree() {
        let content = r#"
mode = "dispatched"
[sink]
name = "net"
sink_type = "tcp"
[sink.params]
addr = "127.0.0.1:514"
"#;
        let json = r#"{
            "mode": "dispatched",
            "sink": {
                "name": "net",
                "sink_type": "tcp",
                "params": { "addr": "127.0.0.1:514" }
            }
        }"#;
        let from_toml = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let from_json = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();

        assert_eq!(from_json.mode, DeliveryMode::Dispatched);
        assert_eq!(from_json.queue, from_toml.queue);
        assert_eq!(from_json.sink.param("addr"), Some("127.0.0.1:514"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use batch_buffer::BatchBuffer;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{QueueConfig, SinkConfig, SinkType};
    use dispatch_queue::RecordDispatcher;
    use sinks::{create_byte_sink, AnySink, SharedSink};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    /// End-to-end test: TOML config -> TcpSink -> BatchBuffer -> TCP peer
    #[tokio::test]
    async fn test_e2e_batched_tcp_delivery() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let receiver = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            socket.read_to_string(&mut received).await.unwrap();
            received
        });

        let content = format!(
            r#"
[buffer]
buffer_size = 32
[sink]
name = "net"
sink_type = "tcp"
[sink.params]
addr = "{addr}"
write_timeout_ms = "1000"
"#
        );
        let blueprint = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();
        let sink = create_byte_sink(&blueprint.sink).await.unwrap();
        let buffer = BatchBuffer::spawn(sink, &blueprint.buffer);

        let mut expected = String::new();
        for i in 0..50 {
            let line = format!("event {i} happened\n");
            expected.push_str(&line);
            buffer.append(line).await;
        }
        let handle = buffer.handle();
        buffer.close().await;

        let received = timeout(Duration::from_secs(5), receiver)
            .await
            .expect("peer never saw the stream end")
            .unwrap();
        assert_eq!(received, expected);

        let metrics = handle.metrics();
        assert_eq!(metrics.written_bytes, expected.len() as u64);
        assert_eq!(metrics.abandoned_batches, 0);
    }

    /// Dispatched mode: every record arrives whole, in some order
    #[tokio::test]
    async fn test_e2e_dispatched_file_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let config = SinkConfig::new("disk", SinkType::File)
            .with_param("path", path.to_string_lossy());

        let sink = create_byte_sink(&config).await.unwrap();
        let dispatcher = RecordDispatcher::new(SharedSink::new(sink), &QueueConfig::new(100, 4));

        for i in 0..40 {
            dispatcher.dispatch(format!("record-{i:02}\n")).unwrap();
        }
        dispatcher.flush().await;
        assert_eq!(dispatcher.metrics().completed_count, 40);

        let sink = std::sync::Arc::clone(dispatcher.sink());
        dispatcher.shutdown().await;
        sink.close().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<_> = written.lines().collect();
        lines.sort_unstable();
        let expected: Vec<_> = (0..40).map(|i| format!("record-{i:02}")).collect();
        assert_eq!(lines, expected);
    }

    /// A dead destination never blocks the producer
    #[tokio::test]
    async fn test_e2e_dead_peer_does_not_block_producer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SinkConfig::new("gone", SinkType::Tcp)
            .with_param("addr", addr.to_string())
            .with_param("connect_timeout_ms", "200");
        let sink = create_byte_sink(&config).await.unwrap();
        let buffer = BatchBuffer::spawn(
            sink,
            &contracts::BufferConfig {
                pending_flushes: 2,
                ..contracts::BufferConfig::with_buffer_size(16)
            },
        );

        timeout(Duration::from_secs(5), async {
            for i in 0..200 {
                buffer.append(format!("line {i} for nobody\n")).await;
            }
        })
        .await
        .expect("producer blocked on a dead peer");

        let handle = buffer.handle();
        buffer.close().await;

        let metrics = handle.metrics();
        assert_eq!(metrics.written_bytes, 0);
        assert!(metrics.abandoned_batches >= 1);
    }

    /// Factory-built memory sinks can be observed through a clone
    #[tokio::test]
    async fn test_e2e_memory_sink_through_factory() {
        let sink = create_byte_sink(&SinkConfig::new("mem", SinkType::Memory))
            .await
            .unwrap();
        let probe = match &sink {
            AnySink::Memory(memory) => memory.clone(),
            _ => panic!("factory built the wrong sink"),
        };

        let buffer = BatchBuffer::new(sink);
        buffer.append("kept ").await;
        buffer.append("in memory").await;
        buffer.flush().await.unwrap();

        assert_eq!(probe.contents_string(), "kept in memory");
        buffer.close().await;
    }
}
