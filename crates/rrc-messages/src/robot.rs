use serde::{Deserialize, Serialize};

use crate::geometry::Pose;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotName {
    pub value: String,
}

/// Free-form state lines reported by the robot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotState {
    pub state: Vec<String>,
}

/// One log line. `level` uses the log-level wire values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    pub url: String,
    /// Camera pose in the robot base frame.
    pub camera_pose: Pose,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStreams {
    pub stream: Vec<VideoStream>,
}
