//! In-memory sinks with scripted failure modes

use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ByteSink, ContractError};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    /// Consume everything
    Accept,
    /// Consume everything after a delay
    Slow(Duration),
    /// Always error
    Unavailable,
    /// Every second call errors
    Flaky,
    /// Odd calls consume half (rounded up), even calls consume the rest
    Leaky,
    /// Consume a single byte per call
    OneByte,
}

#[derive(Debug, Default)]
struct State {
    data: Vec<u8>,
    write_calls: usize,
    closed: bool,
}

/// Cloneable sink; clones share the recorded state
#[derive(Debug, Clone)]
pub(crate) struct TestSink {
    behavior: Behavior,
    state: Arc<Mutex<State>>,
}

impl TestSink {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            state: Arc::default(),
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.state.lock().unwrap().data.clone()).unwrap()
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

impl ByteSink for TestSink {
    fn name(&self) -> &str {
        "test"
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        if let Behavior::Slow(delay) = self.behavior {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        let call = state.write_calls;

        let consumed = match self.behavior {
            Behavior::Accept | Behavior::Slow(_) => buf.len(),
            Behavior::Unavailable => {
                return Err(ContractError::sink_write("test", "sink unavailable"));
            }
            Behavior::Flaky if call % 2 == 0 => {
                return Err(ContractError::sink_write("test", "flaky failure"));
            }
            Behavior::Flaky => buf.len(),
            Behavior::Leaky if call % 2 == 1 => buf.len().div_ceil(2),
            Behavior::Leaky => buf.len(),
            Behavior::OneByte => buf.len().min(1),
        };

        state.data.extend_from_slice(&buf[..consumed]);
        Ok(consumed)
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
