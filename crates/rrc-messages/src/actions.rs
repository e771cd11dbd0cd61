use serde::{Deserialize, Serialize};

use crate::geometry::Pose;

/// Kind of value a simple action accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleActionKind {
    #[default]
    Trigger,
    Value,
}

/// A named switch or scalar action, e.g. "lights" or "gripper".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleAction {
    pub name: String,
    pub kind: SimpleActionKind,
    pub state: f32,
}

impl SimpleAction {
    pub fn new(name: impl Into<String>, state: f32) -> Self {
        Self {
            name: name.into(),
            kind: SimpleActionKind::default(),
            state,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleActions {
    pub actions: Vec<SimpleAction>,
}

impl From<SimpleAction> for SimpleActions {
    fn from(action: SimpleAction) -> Self {
        Self {
            actions: vec![action],
        }
    }
}

/// An action parameterized by one or more poses, e.g. "inspect area".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexAction {
    pub name: String,
    pub poses: Vec<Pose>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexActions {
    pub actions: Vec<ComplexAction>,
}

/// Drive to a waypoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoTo {
    pub waypoint_pose: Pose,
    /// Upper bound on forward speed in m/s; zero lets the robot choose.
    pub max_forward_speed: f64,
    pub waypoint_max_distance: f64,
}
