//! Telemetry buffers keyed by type code.
//!
//! Each slot owns a [`RingBuffer<T>`] whose element type is fixed when the
//! code is registered. The slot also knows how to decode raw payloads into
//! `T` and serialize its latest `T` back out, so the ingestion path can
//! store frames and the read path can forward them without naming `T`.

use std::any::{self, Any, TypeId};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use rrc_frame::{Message, WireFormat};
use tracing::{debug, trace};

use crate::error::{BufferError, Result};
use crate::ring_buffer::RingBuffer;

/// Type-erased view of one registered buffer.
trait TelemetrySlot: Send {
    fn push_serialized(&mut self, type_code: u16, format: WireFormat, payload: &[u8])
        -> Result<()>;
    fn peek_serialized(&self, type_code: u16, format: WireFormat) -> Result<Bytes>;
    fn peek_json(&self, type_code: u16) -> Result<Option<serde_json::Value>>;
    fn len(&self) -> usize;
    fn element_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedSlot<T> {
    ring: RingBuffer<T>,
}

impl<T: Message> TelemetrySlot for TypedSlot<T> {
    fn push_serialized(
        &mut self,
        type_code: u16,
        format: WireFormat,
        payload: &[u8],
    ) -> Result<()> {
        let value = format
            .decode::<T>(payload)
            .map_err(|source| BufferError::Decode { type_code, source })?;
        self.ring.push_overwrite(value);
        Ok(())
    }

    fn peek_serialized(&self, type_code: u16, format: WireFormat) -> Result<Bytes> {
        match self.ring.peek_latest() {
            Some(value) => format
                .encode(value)
                .map(Bytes::from)
                .map_err(|source| BufferError::Encode { type_code, source }),
            None => Ok(Bytes::new()),
        }
    }

    fn peek_json(&self, type_code: u16) -> Result<Option<serde_json::Value>> {
        self.ring
            .peek_latest()
            .map(WireFormat::to_json)
            .transpose()
            .map_err(|source| BufferError::Encode { type_code, source })
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn element_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type Slots = Vec<Option<Box<dyn TelemetrySlot>>>;

/// Registry of per-type telemetry ring buffers.
///
/// All operations take one registry-wide mutex for an O(1) slot lookup and a
/// single buffer operation. Slots are added by [`register`](Self::register)
/// and never removed.
pub struct BufferRegistry {
    format: WireFormat,
    slots: Mutex<Slots>,
}

impl BufferRegistry {
    /// Create an empty registry whose payloads use `format`.
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Payload format used for raw pushes and serialized peeks.
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Bind `type_code` to a buffer of `T` holding up to `capacity` values.
    ///
    /// Registering the same `T` again is a no-op and keeps the existing
    /// contents. A different `T` fails with [`BufferError::TypeMismatch`].
    pub fn register<T: Message>(&self, type_code: u16, capacity: usize) -> Result<()> {
        let mut slots = self.lock();
        let index = usize::from(type_code);
        if slots.len() <= index {
            slots.resize_with(index + 1, || None);
        }

        if let Some(existing) = &slots[index] {
            if existing.element_type() == TypeId::of::<T>() {
                return Ok(());
            }
            return Err(BufferError::TypeMismatch {
                type_code,
                registered: existing.type_name(),
                requested: any::type_name::<T>(),
            });
        }

        slots[index] = Some(Box::new(TypedSlot::<T> {
            ring: RingBuffer::new(capacity),
        }));
        debug!(
            type_code,
            payload = any::type_name::<T>(),
            capacity,
            "registered telemetry buffer"
        );
        Ok(())
    }

    pub fn is_registered(&self, type_code: u16) -> bool {
        slot(&self.lock(), type_code).is_ok()
    }

    /// Registered type codes in ascending order.
    pub fn type_codes(&self) -> Vec<u16> {
        self.lock()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .filter_map(|(index, _)| u16::try_from(index).ok())
            .collect()
    }

    /// Rust type name of the payload stored under `type_code`.
    pub fn type_name(&self, type_code: u16) -> Option<&'static str> {
        slot(&self.lock(), type_code).ok().map(|s| s.type_name())
    }

    /// Number of buffered values for `type_code`.
    pub fn len(&self, type_code: u16) -> Result<usize> {
        Ok(slot(&self.lock(), type_code)?.len())
    }

    /// Decode `payload` as `T` and store it, evicting the oldest value if full.
    pub fn push<T: Message>(&self, type_code: u16, payload: &[u8]) -> Result<()> {
        let mut slots = self.lock();
        let typed = typed_mut::<T>(&mut slots, type_code)?;
        let value = self
            .format
            .decode::<T>(payload)
            .map_err(|source| BufferError::Decode { type_code, source })?;
        typed.ring.push_overwrite(value);
        Ok(())
    }

    /// Store an already-decoded value.
    pub fn push_value<T: Message>(&self, type_code: u16, value: T, overwrite: bool) -> Result<()> {
        let mut slots = self.lock();
        typed_mut::<T>(&mut slots, type_code)?
            .ring
            .push(value, overwrite)
    }

    /// Decode `payload` into whatever type `type_code` was registered with
    /// and store it.
    pub fn push_serialized(&self, type_code: u16, payload: &[u8]) -> Result<()> {
        let format = self.format;
        let mut slots = self.lock();
        slot_mut(&mut slots, type_code)?.push_serialized(type_code, format, payload)?;
        trace!(type_code, len = payload.len(), "buffered telemetry");
        Ok(())
    }

    /// Latest value for `type_code`, serialized in the registry's format.
    ///
    /// Returns empty bytes when nothing has been buffered yet.
    pub fn peek_serialized(&self, type_code: u16) -> Result<Bytes> {
        slot(&self.lock(), type_code)?.peek_serialized(type_code, self.format)
    }

    /// Latest value for `type_code` as JSON.
    pub fn peek_json(&self, type_code: u16) -> Result<Option<serde_json::Value>> {
        slot(&self.lock(), type_code)?.peek_json(type_code)
    }

    /// Copy of the latest value, leaving it buffered.
    pub fn peek_latest<T: Message>(&self, type_code: u16) -> Result<Option<T>> {
        let slots = self.lock();
        Ok(typed::<T>(&slots, type_code)?.ring.peek_latest().cloned())
    }

    /// Remove and return the oldest value.
    pub fn pop_oldest<T: Message>(&self, type_code: u16) -> Result<Option<T>> {
        let mut slots = self.lock();
        Ok(typed_mut::<T>(&mut slots, type_code)?.ring.pop_oldest())
    }

    /// Remove every buffered value, oldest first.
    pub fn drain<T: Message>(&self, type_code: u16) -> Result<Vec<T>> {
        let mut slots = self.lock();
        Ok(typed_mut::<T>(&mut slots, type_code)?.ring.drain())
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new(WireFormat::default())
    }
}

impl fmt::Debug for BufferRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferRegistry")
            .field("format", &self.format)
            .field("type_codes", &self.type_codes())
            .finish()
    }
}

fn slot(slots: &Slots, type_code: u16) -> Result<&(dyn TelemetrySlot + 'static)> {
    slots
        .get(usize::from(type_code))
        .and_then(Option::as_deref)
        .ok_or(BufferError::NotRegistered { type_code })
}

fn slot_mut(slots: &mut Slots, type_code: u16) -> Result<&mut (dyn TelemetrySlot + 'static)> {
    slots
        .get_mut(usize::from(type_code))
        .and_then(Option::as_deref_mut)
        .ok_or(BufferError::NotRegistered { type_code })
}

fn typed<T: Message>(slots: &Slots, type_code: u16) -> Result<&TypedSlot<T>> {
    let slot = slot(slots, type_code)?;
    slot.as_any()
        .downcast_ref::<TypedSlot<T>>()
        .ok_or_else(|| mismatch::<T>(type_code, slot.type_name()))
}

fn typed_mut<T: Message>(slots: &mut Slots, type_code: u16) -> Result<&mut TypedSlot<T>> {
    let slot = slot_mut(slots, type_code)?;
    let registered = slot.type_name();
    slot.as_any_mut()
        .downcast_mut::<TypedSlot<T>>()
        .ok_or_else(|| mismatch::<T>(type_code, registered))
}

fn mismatch<T>(type_code: u16, registered: &'static str) -> BufferError {
    BufferError::TypeMismatch {
        type_code,
        registered,
        requested: any::type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rrc_messages::{Pose, RobotName, Vector3};

    use super::*;

    const POSE: u16 = 1;
    const NAME: u16 = 6;

    fn pose_at(x: f64) -> Pose {
        Pose {
            position: Vector3::new(x, 0.0, 0.0),
            ..Pose::default()
        }
    }

    fn registry() -> BufferRegistry {
        let registry = BufferRegistry::new(WireFormat::Postcard);
        registry.register::<Pose>(POSE, 10).unwrap();
        registry.register::<RobotName>(NAME, 10).unwrap();
        registry
    }

    #[test]
    fn register_grows_table_to_code() {
        let registry = BufferRegistry::default();
        registry.register::<RobotName>(40, 1).unwrap();
        assert!(registry.is_registered(40));
        assert!(!registry.is_registered(39));
        assert!(!registry.is_registered(41));
        assert_eq!(registry.type_codes(), vec![40]);
    }

    #[test]
    fn reregistering_same_type_keeps_contents() {
        let registry = registry();
        registry.push_value(POSE, pose_at(1.0), true).unwrap();
        registry.register::<Pose>(POSE, 3).unwrap();
        assert_eq!(registry.len(POSE).unwrap(), 1);
    }

    #[test]
    fn registering_other_type_fails() {
        let registry = registry();
        let err = registry.register::<RobotName>(POSE, 10).unwrap_err();
        assert!(matches!(
            err,
            BufferError::TypeMismatch { type_code: POSE, .. }
        ));
        assert!(registry.type_name(POSE).unwrap().ends_with("Pose"));
    }

    #[test]
    fn typed_push_then_peek() {
        let registry = registry();
        let payload = WireFormat::Postcard.encode(&pose_at(2.5)).unwrap();
        registry.push::<Pose>(POSE, &payload).unwrap();

        assert_eq!(registry.peek_latest::<Pose>(POSE).unwrap(), Some(pose_at(2.5)));
        // Peek leaves the value in place.
        assert_eq!(registry.len(POSE).unwrap(), 1);
    }

    #[test]
    fn wrong_type_or_unknown_code_is_reported() {
        let registry = registry();
        assert!(matches!(
            registry.peek_latest::<RobotName>(POSE),
            Err(BufferError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.push::<Pose>(NAME, &[]),
            Err(BufferError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.peek_serialized(99),
            Err(BufferError::NotRegistered { type_code: 99 })
        ));
        assert!(matches!(
            registry.push_serialized(0, b"x"),
            Err(BufferError::NotRegistered { type_code: 0 })
        ));
    }

    #[test]
    fn peek_serialized_empty_until_filled() {
        let registry = registry();
        assert!(registry.peek_serialized(POSE).unwrap().is_empty());
        assert_eq!(registry.peek_json(POSE).unwrap(), None);

        registry.push_value(POSE, pose_at(4.0), true).unwrap();
        let expected = WireFormat::Postcard.encode(&pose_at(4.0)).unwrap();
        assert_eq!(registry.peek_serialized(POSE).unwrap().as_ref(), &expected[..]);
    }

    #[test]
    fn push_serialized_decodes_into_registered_type() {
        let registry = registry();
        let name = RobotName {
            value: "rover".into(),
        };
        let payload = WireFormat::Postcard.encode(&name).unwrap();
        registry.push_serialized(NAME, &payload).unwrap();

        assert_eq!(registry.peek_latest::<RobotName>(NAME).unwrap(), Some(name));
        let json = registry.peek_json(NAME).unwrap().unwrap();
        assert_eq!(json["value"], "rover");
    }

    #[test]
    fn undecodable_payload_leaves_buffer_and_lock_intact() {
        let registry = registry();
        registry.push_value(POSE, pose_at(1.0), true).unwrap();

        let err = registry.push_serialized(POSE, &[0xFF; 3]).unwrap_err();
        assert!(matches!(err, BufferError::Decode { type_code: POSE, .. }));

        // The guard was released on the error path.
        registry.push_value(POSE, pose_at(2.0), true).unwrap();
        assert_eq!(registry.len(POSE).unwrap(), 2);
    }

    #[test]
    fn latest_of_many_pushes_within_capacity() {
        let registry = registry();
        for i in 0..25 {
            registry.push_value(POSE, pose_at(f64::from(i)), true).unwrap();
        }
        assert_eq!(registry.len(POSE).unwrap(), 10);
        assert_eq!(registry.peek_latest::<Pose>(POSE).unwrap(), Some(pose_at(24.0)));
        assert_eq!(registry.pop_oldest::<Pose>(POSE).unwrap(), Some(pose_at(15.0)));
        assert_eq!(registry.drain::<Pose>(POSE).unwrap().len(), 9);
    }

    #[test]
    fn full_without_overwrite_preserves_contents() {
        let registry = BufferRegistry::default();
        registry.register::<RobotName>(NAME, 1).unwrap();
        let first = RobotName { value: "a".into() };
        registry.push_value(NAME, first.clone(), false).unwrap();

        let err = registry
            .push_value(NAME, RobotName { value: "b".into() }, false)
            .unwrap_err();
        assert!(matches!(err, BufferError::Full { capacity: 1 }));
        assert_eq!(registry.peek_latest::<RobotName>(NAME).unwrap(), Some(first));
    }

    #[test]
    fn json_registry_uses_json_payloads() {
        let registry = BufferRegistry::new(WireFormat::Json);
        registry.register::<RobotName>(NAME, 2).unwrap();
        registry
            .push_serialized(NAME, br#"{"value":"crawler"}"#)
            .unwrap();
        assert_eq!(
            registry.peek_serialized(NAME).unwrap().as_ref(),
            br#"{"value":"crawler"}"#
        );
    }

    #[test]
    fn concurrent_reader_sees_increasing_values() {
        let registry = Arc::new(registry());

        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..500 {
                    let payload = WireFormat::Postcard.encode(&pose_at(f64::from(i))).unwrap();
                    registry.push_serialized(POSE, &payload).unwrap();
                }
            })
        };

        let reader = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut last = -1.0;
                for _ in 0..500 {
                    if let Some(pose) = registry.peek_latest::<Pose>(POSE).unwrap() {
                        assert!(pose.position.x >= last);
                        last = pose.position.x;
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(
            registry.peek_latest::<Pose>(POSE).unwrap(),
            Some(pose_at(499.0))
        );
    }
}
