use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::ring_buffer::RingBuffer;

/// Ring buffers for sensors that share one payload type, indexed by sensor id.
///
/// The table grows to `max id + 1` the first time an id is seen and never
/// shrinks. Every buffer has the same capacity.
#[derive(Debug)]
pub struct SimpleSensorRegistry<T> {
    capacity: usize,
    sensors: Mutex<Vec<RingBuffer<T>>>,
}

impl<T: Clone> SimpleSensorRegistry<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sensors: Mutex::new(Vec::new()),
        }
    }

    /// Make `sensor_id` addressable.
    pub fn ensure_capacity(&self, sensor_id: usize) {
        grow(&mut self.lock(), sensor_id, self.capacity);
    }

    /// Store a reading, evicting the sensor's oldest one if full.
    pub fn push(&self, sensor_id: usize, value: T) {
        let mut sensors = self.lock();
        grow(&mut sensors, sensor_id, self.capacity);
        sensors[sensor_id].push_overwrite(value);
    }

    /// Copy of the newest reading for `sensor_id`.
    pub fn peek_latest(&self, sensor_id: usize) -> Option<T> {
        self.lock().get(sensor_id)?.peek_latest().cloned()
    }

    pub fn pop_oldest(&self, sensor_id: usize) -> Option<T> {
        self.lock().get_mut(sensor_id)?.pop_oldest()
    }

    /// Number of addressable sensor ids.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of readings buffered for `sensor_id`.
    pub fn buffered(&self, sensor_id: usize) -> usize {
        self.lock().get(sensor_id).map_or(0, RingBuffer::len)
    }

    /// Ids that have at least one buffered reading.
    pub fn active_ids(&self) -> Vec<usize> {
        self.lock()
            .iter()
            .enumerate()
            .filter(|(_, ring)| !ring.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RingBuffer<T>>> {
        self.sensors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn grow<T>(sensors: &mut Vec<RingBuffer<T>>, sensor_id: usize, capacity: usize) {
    if sensors.len() <= sensor_id {
        debug!(from = sensors.len(), to = sensor_id + 1, "growing sensor table");
        sensors.resize_with(sensor_id + 1, || RingBuffer::new(capacity));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn grows_to_exactly_id_plus_one() {
        let registry = SimpleSensorRegistry::<f32>::new(4);
        assert!(registry.is_empty());

        registry.ensure_capacity(5);
        assert_eq!(registry.len(), 6);

        // Smaller ids never shrink the table.
        registry.ensure_capacity(2);
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn sensors_are_independent() {
        let registry = SimpleSensorRegistry::new(4);
        registry.push(0, "a0");
        registry.push(3, "d0");
        registry.push(0, "a1");

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.peek_latest(0), Some("a1"));
        assert_eq!(registry.peek_latest(3), Some("d0"));
        assert_eq!(registry.peek_latest(1), None);
        assert_eq!(registry.buffered(0), 2);
        assert_eq!(registry.active_ids(), vec![0, 3]);
    }

    #[test]
    fn out_of_order_ids_grow_to_largest() {
        let registry = SimpleSensorRegistry::new(4);
        registry.push(0, 10.0);
        registry.push(3, 13.0);
        registry.push(1, 11.0);

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.peek_latest(3), Some(13.0));
        assert_eq!(registry.peek_latest(1), Some(11.0));
        assert_eq!(registry.peek_latest(2), None);
        assert_eq!(registry.active_ids(), vec![0, 1, 3]);
    }

    #[test]
    fn unknown_id_reads_are_empty() {
        let registry = SimpleSensorRegistry::<u8>::new(2);
        assert_eq!(registry.peek_latest(9), None);
        assert_eq!(registry.pop_oldest(9), None);
        assert_eq!(registry.buffered(9), 0);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn readings_overwrite_per_sensor() {
        let registry = SimpleSensorRegistry::new(2);
        for v in 0..5 {
            registry.push(1, v);
        }
        assert_eq!(registry.buffered(1), 2);
        assert_eq!(registry.pop_oldest(1), Some(3));
        assert_eq!(registry.peek_latest(1), Some(4));
    }

    #[test]
    fn concurrent_writers_grow_safely() {
        let registry = Arc::new(SimpleSensorRegistry::new(8));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..50 {
                        registry.push(t * 10 + i % 10, i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 40);
        assert_eq!(registry.peek_latest(39), Some(49));
    }
}
