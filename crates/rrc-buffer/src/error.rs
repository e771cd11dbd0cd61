use rrc_frame::FrameError;

/// Errors that can occur while storing or reading buffered telemetry.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// The buffer is full and overwriting was not allowed.
    #[error("buffer full (capacity {capacity})")]
    Full { capacity: usize },

    /// No buffer was registered for this type code.
    #[error("no buffer registered for type code {type_code}")]
    NotRegistered { type_code: u16 },

    /// The buffer for this type code holds a different payload type.
    #[error("type code {type_code} holds {registered}, not {requested}")]
    TypeMismatch {
        type_code: u16,
        registered: &'static str,
        requested: &'static str,
    },

    /// The payload does not parse as the buffer's type.
    #[error("failed to decode payload for type code {type_code}: {source}")]
    Decode {
        type_code: u16,
        #[source]
        source: FrameError,
    },

    /// The buffered value could not be serialized.
    #[error("failed to encode value for type code {type_code}: {source}")]
    Encode {
        type_code: u16,
        #[source]
        source: FrameError,
    },
}

pub type Result<T> = std::result::Result<T, BufferError>;
