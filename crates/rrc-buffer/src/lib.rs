//! Buffering for robot telemetry.
//!
//! - [`RingBuffer`]: fixed-capacity FIFO of one payload type
//! - [`BufferRegistry`]: one ring buffer per telemetry type code, usable
//!   without knowing the payload type
//! - [`SimpleSensorRegistry`]: one ring buffer per sensor id, for sensors
//!   that share a type code

pub mod error;
pub mod registry;
pub mod ring_buffer;
pub mod sensor;

pub use error::{BufferError, Result};
pub use registry::BufferRegistry;
pub use ring_buffer::RingBuffer;
pub use sensor::SimpleSensorRegistry;
