use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::{ReceiveMode, Transport};

/// One end of an in-process message channel.
///
/// Messages sent on one end of a [`MemoryTransport::pair`] are received on
/// the other, in order. Dropping either end shuts the channel down.
#[derive(Debug)]
pub struct MemoryTransport {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
}

impl MemoryTransport {
    /// Create two connected endpoints.
    pub fn pair() -> (Self, Self) {
        let (left_tx, right_rx) = mpsc::channel();
        let (right_tx, left_rx) = mpsc::channel();
        (
            Self {
                tx: left_tx,
                rx: left_rx,
            },
            Self {
                tx: right_tx,
                rx: right_rx,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.tx
            .send(Bytes::copy_from_slice(message))
            .map_err(|_| TransportError::Shutdown)
    }

    fn receive(&mut self, mode: ReceiveMode) -> Result<Option<Bytes>> {
        match mode {
            ReceiveMode::Blocking => self
                .rx
                .recv()
                .map(Some)
                .map_err(|_| TransportError::Shutdown),
            ReceiveMode::NonBlocking => match self.rx.try_recv() {
                Ok(message) => Ok(Some(message)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(TransportError::Shutdown),
            },
            ReceiveMode::Timeout(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(message) => Ok(Some(message)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(TransportError::Shutdown),
            },
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn messages_arrive_in_order() {
        let (mut left, mut right) = MemoryTransport::pair();
        left.send(b"one").unwrap();
        left.send(b"two").unwrap();

        let first = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
        let second = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert_eq!(first.as_ref(), b"one");
        assert_eq!(second.as_ref(), b"two");
    }

    #[test]
    fn non_blocking_receive_reports_no_data() {
        let (_left, mut right) = MemoryTransport::pair();
        assert!(right.receive(ReceiveMode::NonBlocking).unwrap().is_none());
    }

    #[test]
    fn empty_message_is_not_no_data() {
        let (mut left, mut right) = MemoryTransport::pair();
        left.send(b"").unwrap();

        let message = right.receive(ReceiveMode::NonBlocking).unwrap();
        assert_eq!(message.map(|m| m.len()), Some(0));
    }

    #[test]
    fn timeout_receive_gives_up() {
        let (_left, mut right) = MemoryTransport::pair();
        let start = Instant::now();
        let message = right
            .receive(ReceiveMode::Timeout(Duration::from_millis(20)))
            .unwrap();
        assert!(message.is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn dropped_peer_shuts_down() {
        let (left, mut right) = MemoryTransport::pair();
        drop(left);

        assert!(matches!(
            right.receive(ReceiveMode::Blocking),
            Err(TransportError::Shutdown)
        ));
        assert!(matches!(right.send(b"x"), Err(TransportError::Shutdown)));
    }

    #[test]
    fn pending_messages_survive_peer_drop() {
        let (mut left, mut right) = MemoryTransport::pair();
        left.send(b"last words").unwrap();
        drop(left);

        let message = right.receive(ReceiveMode::NonBlocking).unwrap().unwrap();
        assert_eq!(message.as_ref(), b"last words");
        assert!(matches!(
            right.receive(ReceiveMode::NonBlocking),
            Err(TransportError::Shutdown)
        ));
    }

    #[test]
    fn works_across_threads() {
        let (mut left, mut right) = MemoryTransport::pair();
        let echo = std::thread::spawn(move || {
            let request = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
            right.send(&request).unwrap();
        });

        left.send(b"ping").unwrap();
        let reply = left.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert_eq!(reply.as_ref(), b"ping");
        echo.join().unwrap();
    }
}
