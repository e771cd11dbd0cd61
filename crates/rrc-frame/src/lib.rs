//! Type-tagged framing for robot command and telemetry channels.
//!
//! Every message on either channel is a frame:
//! - a 2-byte little-endian type code naming the payload schema
//! - the payload, serialized in the configured [`WireFormat`]
//!
//! The type code spaces are [`CommandType`] (operator to robot) and
//! [`TelemetryType`] (robot to operator). All endianness handling lives in
//! [`codec`].

pub mod codec;
pub mod error;
pub mod message_types;
pub mod payload;

pub use codec::{
    decode_frame, decode_log_level, decode_request_code, encode_frame, encode_log_level,
    encode_request_code, Frame, LOG_LEVEL_FRAME_SIZE, TYPE_CODE_SIZE,
};
pub use error::{FrameError, Result};
pub use message_types::{telemetry_name, CommandType, LogLevel, MapType, TelemetryType};
pub use payload::{Message, WireFormat};
