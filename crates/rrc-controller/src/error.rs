use std::time::Duration;

/// Errors that can occur in controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] rrc_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] rrc_frame::FrameError),

    /// Telemetry buffer error.
    #[error("buffer error: {0}")]
    Buffer(#[from] rrc_buffer::BufferError),

    /// No reply arrived within the command timeout.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// Earlier commands timed out and their replies never arrived, so the
    /// next reply on the channel cannot be matched to a new command.
    /// Reconnect to recover.
    #[error("command channel out of step: {unanswered} reply(s) still outstanding")]
    Desynced { unanswered: usize },

    /// The reply frame carries a different type code than was requested.
    #[error("unexpected reply type code {found} (expected {expected})")]
    UnexpectedReply { expected: u16, found: u16 },

    /// The controller was built without a telemetry channel.
    #[error("no telemetry channel configured")]
    NoTelemetryChannel,

    /// Configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The ingestion thread could not be started.
    #[error("failed to spawn telemetry worker: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
