//! Payload schemas for robot command and telemetry frames.
//!
//! Plain serde structs. Which schema a frame carries is decided by its type
//! code, never by the payload itself.

pub mod actions;
pub mod geometry;
pub mod joints;
pub mod maps;
pub mod robot;
pub mod sensors;

pub use actions::{
    ComplexAction, ComplexActions, GoTo, SimpleAction, SimpleActionKind, SimpleActions,
};
pub use geometry::{Orientation, Pose, Twist, Vector2, Vector3, Wrench, WrenchState};
pub use joints::JointState;
pub use maps::{Map, MapDefinition, MapsDefinition};
pub use robot::{LogMessage, RobotName, RobotState, VideoStream, VideoStreams};
pub use sensors::{SimpleSensor, SimpleSensors};
