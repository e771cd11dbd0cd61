use serde::{Deserialize, Serialize};

use crate::geometry::{Pose, Vector3};

/// One map the robot can provide. `map_type` uses the map-type wire values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub map_type: u16,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapsDefinition {
    pub maps: Vec<MapDefinition>,
}

/// Map content. Point cloud maps use `points`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub map_type: u16,
    /// Map origin in the world frame.
    pub origin: Pose,
    pub points: Vec<Vector3>,
}
