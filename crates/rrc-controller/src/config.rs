use std::time::Duration;

use rrc_frame::WireFormat;

use crate::error::{ControllerError, Result};

/// Default number of values kept per telemetry type and per sensor.
pub const DEFAULT_BUFFER_SIZE: usize = 10;

/// Default idle sleep between telemetry polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default highest sensor id accepted off the telemetry channel.
pub const DEFAULT_MAX_SENSOR_ID: u32 = 255;

/// Runtime configuration for a [`RobotController`](crate::RobotController).
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Ring buffer capacity for every registered telemetry type and sensor.
    pub buffer_size: usize,
    /// Payload serialization shared with the robot.
    pub wire_format: WireFormat,
    /// Upper bound on the command reply wait. `None` waits forever.
    pub command_timeout: Option<Duration>,
    /// How long the telemetry worker sleeps when no data was pending.
    pub poll_interval: Duration,
    /// Readings with a larger sensor id are rejected instead of growing the
    /// sensor table.
    pub max_sensor_id: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            wire_format: WireFormat::default(),
            command_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_sensor_id: DEFAULT_MAX_SENSOR_ID,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(ControllerError::InvalidConfig(
                "buffer_size must be at least 1".to_string(),
            ));
        }
        if self.command_timeout == Some(Duration::ZERO) {
            return Err(ControllerError::InvalidConfig(
                "command_timeout must be non-zero (omit it to wait indefinitely)".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "poll_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
