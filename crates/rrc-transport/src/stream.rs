use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::envelope::{decode_envelope, encode_envelope, EnvelopeConfig};
use crate::error::{Result, TransportError};
use crate::traits::{ReceiveMode, Transport};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Message transport over a connected Unix domain socket stream.
///
/// Each message is wrapped in a length-prefixed envelope. Partial reads are
/// buffered internally, so a non-blocking receive that only sees half a
/// message returns `None` now and the complete message on a later call.
pub struct StreamTransport {
    stream: UnixStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
    config: EnvelopeConfig,
    nonblocking: bool,
    read_timeout: Option<Duration>,
}

impl StreamTransport {
    /// Wrap a connected stream with default limits.
    pub fn new(stream: UnixStream) -> Result<Self> {
        Self::with_config(stream, EnvelopeConfig::default())
    }

    /// Wrap a connected stream with explicit limits.
    pub fn with_config(stream: UnixStream, config: EnvelopeConfig) -> Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(config.write_timeout)?;
        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            write_buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            nonblocking: false,
            read_timeout: None,
        })
    }

    /// Create two connected, unnamed endpoints.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = UnixStream::pair()?;
        Ok((Self::new(left)?, Self::new(right)?))
    }

    /// Current envelope configuration.
    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Consume the transport and return the inner stream.
    ///
    /// Bytes already buffered from a partial message are discarded.
    pub fn into_inner(self) -> UnixStream {
        self.stream
    }

    fn apply_mode(&mut self, mode: ReceiveMode) -> Result<()> {
        let (nonblocking, timeout) = match mode {
            ReceiveMode::Blocking => (false, None),
            ReceiveMode::NonBlocking => (true, None),
            // A zero read timeout is rejected by the OS; treat it as a poll.
            ReceiveMode::Timeout(d) if d.is_zero() => (true, None),
            ReceiveMode::Timeout(d) => (false, Some(d)),
        };

        if nonblocking != self.nonblocking {
            self.stream.set_nonblocking(nonblocking)?;
            self.nonblocking = nonblocking;
        }
        if !nonblocking && timeout != self.read_timeout {
            self.stream.set_read_timeout(timeout)?;
            self.read_timeout = timeout;
        }
        Ok(())
    }

    fn take_buffered(&mut self) -> Result<Option<Bytes>> {
        decode_envelope(&mut self.read_buf, self.config.max_message_size)
    }
}

impl Transport for StreamTransport {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        if message.len() > self.config.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: message.len(),
                max: self.config.max_message_size,
            });
        }

        // Sends always block; a previous poll may have left the socket non-blocking.
        if self.nonblocking {
            self.stream.set_nonblocking(false)?;
            self.nonblocking = false;
        }

        self.write_buf.clear();
        encode_envelope(message, &mut self.write_buf)?;

        let mut offset = 0usize;
        while offset < self.write_buf.len() {
            match self.stream.write(&self.write_buf[offset..]) {
                Ok(0) => return Err(TransportError::Shutdown),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    return Err(TransportError::Shutdown)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.stream.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        trace!(len = message.len(), "sent message");
        Ok(())
    }

    fn receive(&mut self, mode: ReceiveMode) -> Result<Option<Bytes>> {
        if let Some(message) = self.take_buffered()? {
            return Ok(Some(message));
        }

        self.apply_mode(mode)?;
        let deadline = match mode {
            ReceiveMode::Timeout(d) if !d.is_zero() => Some(Instant::now() + d),
            _ => None,
        };

        let mut first_read = true;
        loop {
            // A partial message must not restart the caller's timeout.
            if let (Some(deadline), false) = (deadline, first_read) {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(None);
                }
                self.apply_mode(ReceiveMode::Timeout(remaining))?;
            }
            first_read = false;

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) if err.kind() == ErrorKind::ConnectionReset => {
                    return Err(TransportError::Shutdown)
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::Shutdown);
            }

            self.read_buf.extend_from_slice(&chunk[..read]);
            if let Some(message) = self.take_buffered()? {
                trace!(len = message.len(), "received message");
                return Ok(Some(message));
            }
        }
    }

    fn name(&self) -> &'static str {
        "unix-stream"
    }
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("buffered", &self.read_buf.len())
            .field("nonblocking", &self.nonblocking)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::thread;

    use super::*;

    #[test]
    fn roundtrip_over_socket_pair() {
        let (mut left, mut right) = StreamTransport::pair().unwrap();

        left.send(b"\x01\x00payload").unwrap();
        let message = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert_eq!(message.as_ref(), b"\x01\x00payload");
    }

    #[test]
    fn non_blocking_without_data_returns_none() {
        let (_left, mut right) = StreamTransport::pair().unwrap();
        assert!(right.receive(ReceiveMode::NonBlocking).unwrap().is_none());
    }

    #[test]
    fn timeout_without_data_returns_none() {
        let (_left, mut right) = StreamTransport::pair().unwrap();
        let message = right
            .receive(ReceiveMode::Timeout(Duration::from_millis(20)))
            .unwrap();
        assert!(message.is_none());
    }

    #[test]
    fn send_after_non_blocking_poll() {
        let (mut left, mut right) = StreamTransport::pair().unwrap();
        assert!(left.receive(ReceiveMode::NonBlocking).unwrap().is_none());

        left.send(b"after poll").unwrap();
        let message = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert_eq!(message.as_ref(), b"after poll");
    }

    #[test]
    fn partial_message_is_completed_later() {
        let (raw, right) = UnixStream::pair().unwrap();
        let mut right = StreamTransport::new(right).unwrap();
        let mut raw = raw;

        let mut wire = BytesMut::new();
        encode_envelope(b"split message", &mut wire).unwrap();
        let (head, tail) = wire.split_at(4);

        raw.write_all(head).unwrap();
        assert!(right.receive(ReceiveMode::NonBlocking).unwrap().is_none());

        raw.write_all(tail).unwrap();
        let message = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert_eq!(message.as_ref(), b"split message");
    }

    #[test]
    fn trickled_message_respects_total_timeout() {
        let (raw, right) = UnixStream::pair().unwrap();
        let mut right = StreamTransport::new(right).unwrap();

        let mut wire = BytesMut::new();
        encode_envelope(b"slow robot reply", &mut wire).unwrap();
        let writer = thread::spawn(move || {
            let mut raw = raw;
            for byte in wire.iter() {
                raw.write_all(&[*byte]).unwrap();
                thread::sleep(Duration::from_millis(30));
            }
            raw
        });

        let started = Instant::now();
        let message = right
            .receive(ReceiveMode::Timeout(Duration::from_millis(100)))
            .unwrap();
        assert!(message.is_none());
        assert!(started.elapsed() < Duration::from_millis(300));

        let _raw = writer.join().unwrap();
        let message = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert_eq!(message.as_ref(), b"slow robot reply");
    }

    #[test]
    fn many_messages_in_one_read() {
        let (mut left, mut right) = StreamTransport::pair().unwrap();
        for i in 0..16u8 {
            left.send(&[i, 0, i]).unwrap();
        }

        for i in 0..16u8 {
            let message = right.receive(ReceiveMode::Blocking).unwrap().unwrap();
            assert_eq!(message.as_ref(), &[i, 0, i]);
        }
    }

    #[test]
    fn peer_close_reports_shutdown() {
        let (left, mut right) = StreamTransport::pair().unwrap();
        drop(left);
        assert!(matches!(
            right.receive(ReceiveMode::Blocking),
            Err(TransportError::Shutdown)
        ));
    }

    #[test]
    fn garbage_on_stream_is_rejected() {
        let (mut raw, right) = UnixStream::pair().unwrap();
        let mut right = StreamTransport::new(right).unwrap();
        raw.write_all(&[0x00, 0x01, 0, 0, 0, 0]).unwrap();

        assert!(matches!(
            right.receive(ReceiveMode::Blocking),
            Err(TransportError::InvalidMagic)
        ));
    }

    #[test]
    fn oversized_send_rejected() {
        let (left, _right) = UnixStream::pair().unwrap();
        let config = EnvelopeConfig {
            max_message_size: 4,
            ..EnvelopeConfig::default()
        };
        let mut left = StreamTransport::with_config(left, config).unwrap();
        assert!(matches!(
            left.send(b"too large"),
            Err(TransportError::MessageTooLarge { size: 9, max: 4 })
        ));
    }

    #[test]
    fn request_reply_across_threads() {
        let (mut operator, mut robot) = StreamTransport::pair().unwrap();
        let server = thread::spawn(move || {
            let request = robot.receive(ReceiveMode::Blocking).unwrap().unwrap();
            assert_eq!(request.as_ref(), b"\x01\x00target");
            robot.send(b"").unwrap();
        });

        operator.send(b"\x01\x00target").unwrap();
        let reply = operator.receive(ReceiveMode::Blocking).unwrap().unwrap();
        assert!(reply.is_empty());
        server.join().unwrap();
    }
}
