use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Envelope header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "RC" (0x52 0x43).
pub const MAGIC: [u8; 2] = [0x52, 0x43];

/// Default maximum message size: 16 MiB.
pub const DEFAULT_MAX_MESSAGE: usize = 16 * 1024 * 1024;

/// Wrap one message for a byte stream.
///
/// Stream sockets have no message boundaries, so [`StreamTransport`]
/// delimits every message with this envelope:
/// ```text
/// ┌──────────────┬───────────┬──────────────────┐
/// │ Magic (2B)   │ Length    │ Message           │
/// │ 0x52 0x43    │ (4B LE)   │ (Length bytes)    │
/// └──────────────┴───────────┴──────────────────┘
/// ```
///
/// [`StreamTransport`]: crate::StreamTransport
pub fn encode_envelope(message: &[u8], dst: &mut BytesMut) -> Result<()> {
    if message.len() > u32::MAX as usize {
        return Err(TransportError::MessageTooLarge {
            size: message.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + message.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(message.len() as u32);
    dst.put_slice(message);
    Ok(())
}

/// Take one complete message out of `src`.
///
/// Returns `Ok(None)` until `src` holds a whole envelope; the partial bytes
/// stay in `src` for the next call.
pub fn decode_envelope(src: &mut BytesMut, max_message: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(TransportError::InvalidMagic);
    }

    let len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if len > max_message {
        return Err(TransportError::MessageTooLarge {
            size: len,
            max: max_message,
        });
    }

    if src.len() < HEADER_SIZE + len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}

/// Limits applied by stream transports.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Maximum message size in bytes. Default: 16 MiB.
    pub max_message_size: usize,
    /// Write timeout for blocking sends.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_waits_for_complete_header() {
        let mut buf = BytesMut::from(&[0x52, 0x43, 0x01][..]);
        assert!(decode_envelope(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn decode_waits_for_complete_message() {
        let mut buf = BytesMut::new();
        encode_envelope(b"telemetry", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 4);

        assert!(decode_envelope(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0, 0, 0, 0][..]);
        let result = decode_envelope(&mut buf, DEFAULT_MAX_MESSAGE);
        assert!(matches!(result, Err(TransportError::InvalidMagic)));
    }

    #[test]
    fn decode_rejects_oversized_message() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024);

        let result = decode_envelope(&mut buf, 16);
        assert!(matches!(
            result,
            Err(TransportError::MessageTooLarge {
                size: 1024,
                max: 16
            })
        ));
    }

    #[test]
    fn back_to_back_messages_split_cleanly() {
        let mut buf = BytesMut::new();
        encode_envelope(b"\x01\x00pose", &mut buf).unwrap();
        encode_envelope(b"", &mut buf).unwrap();
        encode_envelope(b"\x08\x00log", &mut buf).unwrap();

        let first = decode_envelope(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        let empty = decode_envelope(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        let last = decode_envelope(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();

        assert_eq!(first.as_ref(), b"\x01\x00pose");
        assert!(empty.is_empty());
        assert_eq!(last.as_ref(), b"\x08\x00log");
        assert!(buf.is_empty());
    }
}
