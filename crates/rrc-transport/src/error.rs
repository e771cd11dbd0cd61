use std::path::PathBuf;

/// Errors that can occur while moving messages over a channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be created.
    #[error("cannot listen on {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Nothing accepted a connection at this path.
    #[error("cannot reach robot at {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Waiting for an operator to connect failed.
    #[error("accept failed: {0}")]
    Accept(std::io::Error),

    /// Reading or writing the connected stream failed.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `sun_path` cannot hold this socket path.
    #[error("socket path {path} is {len} bytes, limit is {max}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The envelope header does not start with the expected magic bytes.
    #[error("invalid envelope magic (expected 0x5243 \"RC\")")]
    InvalidMagic,

    /// A message exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The other end of the channel is gone.
    #[error("channel closed by peer")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
