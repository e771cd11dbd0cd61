use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of the type code that prefixes every frame.
pub const TYPE_CODE_SIZE: usize = 2;

/// Size of the legacy log-level frame: type code + `u32` level.
pub const LOG_LEVEL_FRAME_SIZE: usize = TYPE_CODE_SIZE + 4;

/// One message on a command or telemetry channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Schema of the payload, from [`CommandType`] or [`TelemetryType`].
    ///
    /// [`CommandType`]: crate::CommandType
    /// [`TelemetryType`]: crate::TelemetryType
    pub type_code: u16,
    /// Serialized payload, possibly empty.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(type_code: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            type_code,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        TYPE_CODE_SIZE + self.payload.len()
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_frame(self.type_code, &self.payload, &mut buf);
        buf.freeze()
    }
}

/// Encode a frame into the wire format.
///
/// ```text
/// ┌──────────────┬─────────────────────────┐
/// │ Type (2B LE) │ Payload (rest of frame) │
/// └──────────────┴─────────────────────────┘
/// ```
pub fn encode_frame(type_code: u16, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(TYPE_CODE_SIZE + payload.len());
    dst.put_u16_le(type_code);
    dst.put_slice(payload);
}

/// Split a received message into type code and payload.
///
/// The payload shares the message's allocation.
pub fn decode_frame(message: Bytes) -> Result<Frame> {
    if message.len() < TYPE_CODE_SIZE {
        return Err(FrameError::Truncated {
            len: message.len(),
            min: TYPE_CODE_SIZE,
        });
    }

    let mut header = &message[..TYPE_CODE_SIZE];
    let type_code = header.get_u16_le();
    let payload = message.slice(TYPE_CODE_SIZE..);

    Ok(Frame { type_code, payload })
}

/// Encode the log-level-select frame.
///
/// This frame carries a raw `u32` instead of a serialized message.
pub fn encode_log_level(type_code: u16, level: u32, dst: &mut BytesMut) {
    dst.reserve(LOG_LEVEL_FRAME_SIZE);
    dst.put_u16_le(type_code);
    dst.put_u32_le(level);
}

/// Read the level out of a decoded log-level-select frame.
pub fn decode_log_level(frame: &Frame) -> Result<u32> {
    let mut payload = frame.payload.as_ref();
    if payload.len() < 4 {
        return Err(FrameError::Truncated {
            len: frame.wire_size(),
            min: LOG_LEVEL_FRAME_SIZE,
        });
    }
    Ok(payload.get_u32_le())
}

/// Encode a bare type code as a payload (telemetry and map requests).
pub fn encode_request_code(code: u16) -> [u8; TYPE_CODE_SIZE] {
    code.to_le_bytes()
}

/// Decode a bare type code payload.
pub fn decode_request_code(payload: &[u8]) -> Result<u16> {
    match payload {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(FrameError::Truncated {
            len: payload.len(),
            min: TYPE_CODE_SIZE,
        }),
    }
}
