//! FileSink - appends batches to a file on disk

use contracts::{ByteSink, ContractError, SinkConfig};
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file, created with its parent directories
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from sink params
    ///
    /// # Errors
    /// Returns a validation error if `path` is missing.
    pub fn from_config(config: &SinkConfig) -> Result<Self, ContractError> {
        let path = config.param("path").ok_or_else(|| {
            ContractError::config_validation("sink.params.path", "file sink requires a path")
        })?;

        Ok(Self {
            path: PathBuf::from(path),
        })
    }
}

/// Sink that appends to a file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: Option<File>,
}

impl FileSink {
    /// Open (or create) the file in append mode
    #[instrument(name = "file_sink_new", skip(name, config), fields(path = %config.path.display()))]
    pub async fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        let name = name.into();
        debug!(sink = %name, path = %config.path.display(), "FileSink opened");

        Ok(Self {
            name,
            config,
            file: Some(file),
        })
    }

    /// Create from sink config (for factory)
    pub async fn from_config(config: &SinkConfig) -> Result<Self, ContractError> {
        let file_config = FileSinkConfig::from_config(config)?;
        Self::new(&config.name, file_config)
            .await
            .map_err(|e| ContractError::sink_connection(&config.name, e.to_string()))
    }

    /// Output file path
    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    fn file(&mut self) -> Result<&mut File, ContractError> {
        self.file
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "file closed"))
    }

    fn write_error(&self, e: std::io::Error) -> ContractError {
        error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Write failed");
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl ByteSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, buf),
        fields(sink = %self.name, bytes = buf.len())
    )]
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        let file = self.file()?;
        let result = match file.write(buf).await {
            Ok(n) => file.flush().await.map(|()| n),
            Err(e) => Err(e),
        };
        result.map_err(|e| self.write_error(e))
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        match self.file.as_mut() {
            Some(file) => file
                .sync_data()
                .await
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string())),
            None => Ok(()),
        }
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("nested").join("out.log"),
        };

        let mut sink = FileSink::new("test_file", config).await.unwrap();
        assert_eq!(sink.write(b"hello\n").await.unwrap(), 6);
        sink.flush().await.unwrap();

        // Parent directory was created and the bytes are on disk
        let written = std::fs::read_to_string(dir.path().join("nested/out.log")).unwrap();
        assert_eq!(written, "hello\n");
    }

    #[tokio::test]
    async fn test_file_sink_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "old\n").unwrap();

        let mut sink = FileSink::new("test_file", FileSinkConfig { path: path.clone() })
            .await
            .unwrap();
        sink.write(b"new\n").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("out.log"),
        };

        let mut sink = FileSink::new("test_file", config).await.unwrap();
        sink.close().await.unwrap();

        assert!(sink.write(b"late").await.is_err());
    }

    #[test]
    fn test_config_requires_path() {
        let config = SinkConfig::new("f", SinkType::File);
        assert!(FileSinkConfig::from_config(&config).is_err());

        let config = config.with_param("path", "/tmp/x.log");
        let parsed = FileSinkConfig::from_config(&config).unwrap();
        assert_eq!(parsed.path, PathBuf::from("/tmp/x.log"));
    }
}
