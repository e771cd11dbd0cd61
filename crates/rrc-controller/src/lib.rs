//! Operator-side robot controller.
//!
//! A [`RobotController`] owns a command channel and, optionally, a
//! telemetry channel. Commands are framed with their type code and sent
//! request/reply. Telemetry is drained with [`RobotController::poll_once`]
//! (or continuously by a [`TelemetryWorker`]) and routed into ring buffers
//! by type code.

pub mod config;
pub mod controller;
pub mod error;
pub mod worker;

pub use config::{
    ControllerConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_SENSOR_ID, DEFAULT_POLL_INTERVAL,
};
pub use controller::{RobotController, Routed, TelemetryStats};
pub use error::{ControllerError, Result};
pub use worker::{TelemetryWorker, WorkerExit};
