use crate::payload::WireFormat;

/// Errors that can occur while framing or (de)serializing payloads.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is too short to hold the expected header.
    #[error("truncated frame ({len} bytes, need at least {min})")]
    Truncated { len: usize, min: usize },

    /// A payload could not be serialized.
    #[error("failed to encode {format} payload: {message}")]
    Encode {
        format: WireFormat,
        message: String,
    },

    /// A payload does not parse as the expected type.
    #[error("failed to decode {format} payload: {message}")]
    Decode {
        format: WireFormat,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
