use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// How [`Transport::receive`] waits for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    /// Wait until a message arrives or the channel fails.
    Blocking,
    /// Return immediately with `None` when nothing is pending.
    NonBlocking,
    /// Wait at most the given duration, then return `None`.
    Timeout(Duration),
}

/// A message-oriented channel endpoint.
///
/// Implementations deliver whole messages: one `send` on one side produces
/// exactly one `Some(bytes)` from `receive` on the other side. A zero-length
/// message is a valid message and is distinct from `None` ("no data").
pub trait Transport: Send {
    /// Send one complete message.
    fn send(&mut self, message: &[u8]) -> Result<()>;

    /// Receive one complete message.
    ///
    /// Returns `Ok(None)` when `mode` is non-blocking and nothing is
    /// pending, or when a timeout elapses.
    fn receive(&mut self, mode: ReceiveMode) -> Result<Option<Bytes>>;

    /// Short transport name for diagnostics.
    fn name(&self) -> &'static str {
        "transport"
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self, mode: ReceiveMode) -> Result<Option<Bytes>> {
        (**self).receive(mode)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
