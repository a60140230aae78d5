//! Messages exchanged between producers, the command loop and the write loop

use bytes::Bytes;
use tokio::sync::oneshot;

/// Instruction for the command loop
#[derive(Debug)]
pub(crate) enum Command {
    /// Append bytes to the accumulator
    Append(Bytes),
    /// Snapshot the accumulator and ack once the write loop attempted it
    Flush(oneshot::Sender<()>),
    /// Hand off what is left and stop
    Shutdown,
}

/// Snapshot of the accumulator handed to the write loop
#[derive(Debug)]
pub(crate) struct FlushRequest {
    /// Bytes to write
    pub payload: Bytes,
    /// Fired once the payload was attempted (explicit flushes only)
    pub ack: Option<oneshot::Sender<()>>,
}

impl FlushRequest {
    /// Fire-and-forget flush (size, idle or close triggered)
    pub fn new(payload: Bytes) -> Self {
        Self { payload, ack: None }
    }

    /// Flush with a completion signal
    pub fn with_ack(payload: Bytes, ack: oneshot::Sender<()>) -> Self {
        Self {
            payload,
            ack: Some(ack),
        }
    }
}
