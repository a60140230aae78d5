//! MemorySink - keeps everything written, for inspection

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ByteSink, ContractError};

/// Sink that appends into shared memory
///
/// Clones share the same contents, so a clone can be kept for inspection
/// after the original is handed to a buffer.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    data: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create an empty MemorySink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Arc::default(),
        }
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Contents as text (lossy)
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Number of bytes written
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing was written
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discard everything written so far
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A panicking reader can't leave the Vec half-written
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ByteSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
