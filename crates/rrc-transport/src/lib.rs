//! Message transport capability for robot remote control.
//!
//! The controller only needs two things from a channel: send a whole
//! message, and receive a whole message either blocking, non-blocking or
//! with a timeout. Everything above this crate talks to a [`Transport`].
//!
//! Provided implementations:
//! - [`MemoryTransport`]: in-process pair, used for loopback and tests
//! - [`StreamTransport`]: Unix domain socket stream with a length-prefixed
//!   envelope (Linux/macOS)

pub mod envelope;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod stream;
#[cfg(unix)]
pub mod uds;

pub use envelope::{decode_envelope, encode_envelope, EnvelopeConfig, DEFAULT_MAX_MESSAGE};
pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::{ReceiveMode, Transport};

#[cfg(unix)]
pub use stream::StreamTransport;
#[cfg(unix)]
pub use uds::UnixDomainSocket;
