use serde::{Deserialize, Serialize};

use crate::geometry::Vector2;

/// Generic array sensor.
///
/// Definitions (sent as part of [`SimpleSensors`]) carry `id`, `name`,
/// `size` and `scale` with an empty `value`. Readings carry `id` and the
/// row-major `value` array of `size.x * size.y` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleSensor {
    pub id: u32,
    pub name: String,
    pub size: Vector2,
    pub scale: Vector2,
    pub value: Vec<f32>,
}

impl SimpleSensor {
    /// A reading for sensor `id`.
    pub fn reading(id: u32, value: Vec<f32>) -> Self {
        Self {
            id,
            value,
            ..Self::default()
        }
    }

    /// Value at grid cell `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> Option<f32> {
        let width = self.size.x as usize;
        if x >= width {
            return None;
        }
        let index = y.checked_mul(width)?.checked_add(x)?;
        self.value.get(index).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleSensors {
    pub sensors: Vec<SimpleSensor>,
}

impl SimpleSensors {
    pub fn by_name(&self, name: &str) -> Option<&SimpleSensor> {
        self.sensors.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indexing_is_row_major() {
        let sensor = SimpleSensor {
            size: Vector2::new(2.0, 2.0),
            value: vec![1.0, 2.0, 3.0, 4.0],
            ..SimpleSensor::reading(3, Vec::new())
        };
        assert_eq!(sensor.at(1, 0), Some(2.0));
        assert_eq!(sensor.at(0, 1), Some(3.0));
        assert_eq!(sensor.at(2, 0), None);
        assert_eq!(sensor.at(0, 2), None);
    }

    #[test]
    fn far_out_of_range_cell_is_none() {
        let sensor = SimpleSensor {
            size: Vector2::new(4.0, 1.0),
            value: vec![0.0; 4],
            ..SimpleSensor::default()
        };
        assert_eq!(sensor.at(0, usize::MAX), None);
        assert_eq!(sensor.at(3, usize::MAX / 4), None);
    }

    #[test]
    fn reading_survives_postcard() {
        let reading = SimpleSensor::reading(7, vec![21.5]);
        let bytes = postcard::to_allocvec(&reading).unwrap();
        let back: SimpleSensor = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back, reading);
    }
}
