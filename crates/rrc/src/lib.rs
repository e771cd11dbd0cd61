//! Robot remote control.
//!
//! An operator process talks to a robot over two channels: a command
//! channel (request/reply) and a telemetry channel (robot-initiated). Every
//! message is a frame tagged with a 16-bit type code; telemetry is kept in
//! per-type ring buffers so readers always see the latest values.
//!
//! # Crate Structure
//!
//! - [`transport`]: channel abstraction, in-memory pairs and Unix sockets
//! - [`frame`]: type-code framing, type enumerations and payload formats
//! - [`messages`]: payload schemas
//! - [`buffer`]: ring buffers and the type-erased buffer registry
//! - [`controller`]: command dispatch and telemetry ingestion

/// Re-export transport types.
pub mod transport {
    pub use rrc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rrc_frame::*;
}

/// Re-export message schemas.
pub mod messages {
    pub use rrc_messages::*;
}

/// Re-export buffer types.
pub mod buffer {
    pub use rrc_buffer::*;
}

/// Re-export controller types.
pub mod controller {
    pub use rrc_controller::*;
}

pub use rrc_controller::{ControllerConfig, RobotController, TelemetryWorker};
