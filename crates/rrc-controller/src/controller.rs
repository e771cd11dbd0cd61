use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use rrc_buffer::{BufferError, BufferRegistry, SimpleSensorRegistry};
use rrc_frame::{
    decode_frame, encode_frame, encode_log_level, encode_request_code, CommandType, LogLevel,
    MapType, Message, TelemetryType, TYPE_CODE_SIZE,
};
use rrc_messages::{
    ComplexAction, ComplexActions, GoTo, JointState, LogMessage, Map, MapsDefinition, Pose,
    RobotName, RobotState, SimpleAction, SimpleActions, SimpleSensor, SimpleSensors, Twist,
    VideoStreams, WrenchState,
};
use rrc_transport::{ReceiveMode, Transport};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ControllerConfig;
use crate::error::{ControllerError, Result};

type Channel = Mutex<Box<dyn Transport>>;

/// Command transport plus the count of timed-out commands whose replies
/// may still be in flight.
struct CommandChannel {
    transport: Box<dyn Transport>,
    unanswered: usize,
}

impl CommandChannel {
    /// Throw away replies that arrived for commands which already timed out.
    fn discard_late_replies(&mut self) -> Result<()> {
        while self.unanswered > 0 {
            match self.transport.receive(ReceiveMode::NonBlocking)? {
                Some(late) => {
                    self.unanswered -= 1;
                    debug!(
                        len = late.len(),
                        outstanding = self.unanswered,
                        "discarded late command reply"
                    );
                }
                None => break,
            }
        }
        Ok(())
    }
}

/// Where [`RobotController::evaluate_telemetry`] put a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Stored in the buffer for this type code.
    Buffered(u16),
    /// Stored in the sensor registry under this sensor id.
    Sensor { id: u32 },
    /// Sensor id above `max_sensor_id`; dropped.
    SensorOutOfRange { id: u32 },
    /// No buffer for this type code; dropped.
    Ignored(u16),
    /// Shorter than a type code; dropped.
    Malformed,
    /// Payload did not parse as the registered type; dropped.
    DecodeFailed(u16),
}

/// Counters for telemetry ingestion since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub buffered: u64,
    pub sensor: u64,
    pub rejected: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub decode_failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    buffered: AtomicU64,
    sensor: AtomicU64,
    rejected: AtomicU64,
    ignored: AtomicU64,
    malformed: AtomicU64,
    decode_failed: AtomicU64,
}

impl Counters {
    fn record(&self, routed: Routed) {
        let counter = match routed {
            Routed::Buffered(_) => &self.buffered,
            Routed::Sensor { .. } => &self.sensor,
            Routed::SensorOutOfRange { .. } => &self.rejected,
            Routed::Ignored(_) => &self.ignored,
            Routed::Malformed => &self.malformed,
            Routed::DecodeFailed(_) => &self.decode_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TelemetryStats {
        TelemetryStats {
            buffered: self.buffered.load(Ordering::Relaxed),
            sensor: self.sensor.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            decode_failed: self.decode_failed.load(Ordering::Relaxed),
        }
    }
}

/// Operator-side endpoint of a robot link.
///
/// Sends typed commands on the command channel and waits for each reply.
/// Telemetry frames received on the telemetry channel are routed by type
/// code into per-type ring buffers (and per-sensor buffers for simple
/// sensor readings) where readers can pick up the latest values.
///
/// All methods take `&self`, so a controller can be shared through an
/// `Arc` between a [`TelemetryWorker`](crate::TelemetryWorker) and readers.
/// Overlapping commands are serialized on the command channel. A command
/// that times out leaves the channel out of step until its late reply has
/// been received and discarded.
pub struct RobotController {
    command: Mutex<CommandChannel>,
    telemetry: Option<Channel>,
    buffers: Arc<BufferRegistry>,
    sensors: Arc<SimpleSensorRegistry<SimpleSensor>>,
    config: ControllerConfig,
    counters: Counters,
}

impl RobotController {
    /// Create a controller and register the standard telemetry types.
    pub fn new(
        command: Box<dyn Transport>,
        telemetry: Option<Box<dyn Transport>>,
        config: ControllerConfig,
    ) -> Result<Self> {
        config.validate()?;

        debug!(
            command = command.name(),
            telemetry = telemetry.as_ref().map(|t| t.name()),
            format = %config.wire_format,
            buffer_size = config.buffer_size,
            "creating robot controller"
        );

        let controller = Self {
            command: Mutex::new(CommandChannel {
                transport: command,
                unanswered: 0,
            }),
            telemetry: telemetry.map(Mutex::new),
            buffers: Arc::new(BufferRegistry::new(config.wire_format)),
            sensors: Arc::new(SimpleSensorRegistry::new(config.buffer_size)),
            config,
            counters: Counters::default(),
        };

        controller.register_telemetry_type::<Pose>(TelemetryType::CurrentPose.code())?;
        controller.register_telemetry_type::<JointState>(TelemetryType::JointState.code())?;
        controller
            .register_telemetry_type::<JointState>(TelemetryType::ControllableJoints.code())?;
        controller.register_telemetry_type::<SimpleActions>(TelemetryType::SimpleActions.code())?;
        controller
            .register_telemetry_type::<ComplexActions>(TelemetryType::ComplexActions.code())?;
        controller.register_telemetry_type::<RobotName>(TelemetryType::RobotName.code())?;
        controller.register_telemetry_type::<RobotState>(TelemetryType::RobotState.code())?;
        controller.register_telemetry_type::<LogMessage>(TelemetryType::LogMessage.code())?;
        controller.register_telemetry_type::<VideoStreams>(TelemetryType::VideoStreams.code())?;
        controller.register_telemetry_type::<SimpleSensors>(
            TelemetryType::SimpleSensorDefinition.code(),
        )?;
        controller.register_telemetry_type::<WrenchState>(TelemetryType::WrenchState.code())?;
        controller
            .register_telemetry_type::<MapsDefinition>(TelemetryType::MapsDefinition.code())?;
        controller.register_telemetry_type::<Map>(TelemetryType::Map.code())?;

        Ok(controller)
    }

    /// Buffer telemetry frames with `type_code` as values of `T`.
    ///
    /// Use this for type codes newer than [`TelemetryType`].
    pub fn register_telemetry_type<T: Message>(&self, type_code: u16) -> Result<()> {
        self.buffers
            .register::<T>(type_code, self.config.buffer_size)
            .map_err(Into::into)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn has_telemetry(&self) -> bool {
        self.telemetry.is_some()
    }

    /// Shared handle to the per-type buffers.
    pub fn buffers(&self) -> Arc<BufferRegistry> {
        Arc::clone(&self.buffers)
    }

    /// Shared handle to the per-sensor buffers.
    pub fn sensors(&self) -> Arc<SimpleSensorRegistry<SimpleSensor>> {
        Arc::clone(&self.sensors)
    }

    pub fn stats(&self) -> TelemetryStats {
        self.counters.snapshot()
    }

    // --- Command path ---

    /// Send one framed command and wait for the robot's reply.
    ///
    /// The wait is bounded by `command_timeout` when configured and is
    /// unbounded otherwise. The reply is returned as received; a
    /// zero-length reply is valid.
    ///
    /// Replies that arrive after their command timed out are discarded
    /// before the next command is sent. While any are still missing the
    /// command is refused with [`ControllerError::Desynced`].
    pub fn send_command(&self, type_code: u16, payload: &[u8]) -> Result<Bytes> {
        let mut message = BytesMut::with_capacity(TYPE_CODE_SIZE + payload.len());
        encode_frame(type_code, payload, &mut message);
        self.transact(type_code, &message, self.config.command_timeout)
    }

    /// Like [`send_command`](Self::send_command) with an explicit reply timeout.
    pub fn send_command_with_timeout(
        &self,
        type_code: u16,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Bytes> {
        let mut message = BytesMut::with_capacity(TYPE_CODE_SIZE + payload.len());
        encode_frame(type_code, payload, &mut message);
        self.transact(type_code, &message, Some(timeout))
    }

    pub fn set_target_pose(&self, pose: &Pose) -> Result<Bytes> {
        self.send_message(CommandType::TargetPoseCommand, pose)
    }

    pub fn set_twist_command(&self, twist: &Twist) -> Result<Bytes> {
        self.send_message(CommandType::TwistCommand, twist)
    }

    pub fn set_joint_command(&self, joints: &JointState) -> Result<Bytes> {
        self.send_message(CommandType::JointsCommand, joints)
    }

    /// Trigger one simple action. It is sent as a one-element [`SimpleActions`].
    pub fn set_simple_action_command(&self, action: &SimpleAction) -> Result<Bytes> {
        let actions = SimpleActions::from(action.clone());
        self.send_message(CommandType::SimpleActionsCommand, &actions)
    }

    pub fn set_complex_action_command(&self, action: &ComplexAction) -> Result<Bytes> {
        self.send_message(CommandType::ComplexActionCommand, action)
    }

    pub fn set_go_to_command(&self, goto: &GoTo) -> Result<Bytes> {
        self.send_message(CommandType::GotoCommand, goto)
    }

    /// Select the robot's log verbosity.
    ///
    /// Sent as a fixed six-byte frame (type code + `u32` level).
    pub fn set_log_level(&self, level: LogLevel) -> Result<Bytes> {
        let code = CommandType::LogLevelSelect.code();
        let mut message = BytesMut::new();
        encode_log_level(code, level.0, &mut message);
        self.transact(code, &message, self.config.command_timeout)
    }

    /// Ask the robot for the current value of one telemetry type.
    ///
    /// The reply must be a frame carrying the requested type code.
    pub fn request_telemetry<T: Message>(&self, kind: TelemetryType) -> Result<T> {
        let payload = self.telemetry_request(kind)?;
        Ok(self.config.wire_format.decode(&payload)?)
    }

    /// Ask the robot for one telemetry value and store it in its buffer.
    pub fn request_telemetry_into_buffer(&self, kind: TelemetryType) -> Result<()> {
        let payload = self.telemetry_request(kind)?;
        self.buffers.push_serialized(kind.code(), &payload)?;
        Ok(())
    }

    /// Ask the robot for a map. The reply must be a [`TelemetryType::Map`] frame.
    pub fn request_map(&self, map_type: MapType) -> Result<Map> {
        let reply = self.send_command(
            CommandType::MapRequest.code(),
            &encode_request_code(map_type.code()),
        )?;
        let payload = expect_frame(TelemetryType::Map.code(), reply)?;
        Ok(self.config.wire_format.decode(&payload)?)
    }

    fn telemetry_request(&self, kind: TelemetryType) -> Result<Bytes> {
        let reply = self.send_command(
            CommandType::TelemetryRequest.code(),
            &encode_request_code(kind.code()),
        )?;
        expect_frame(kind.code(), reply)
    }

    fn send_message<T: Serialize>(&self, kind: CommandType, value: &T) -> Result<Bytes> {
        let payload = self.config.wire_format.encode(value)?;
        self.send_command(kind.code(), &payload)
    }

    fn transact(&self, type_code: u16, message: &[u8], timeout: Option<Duration>) -> Result<Bytes> {
        let mut command = self.command.lock().unwrap_or_else(PoisonError::into_inner);
        command.discard_late_replies()?;
        if command.unanswered > 0 {
            debug!(type_code, unanswered = command.unanswered, "refusing command");
            return Err(ControllerError::Desynced {
                unanswered: command.unanswered,
            });
        }

        command.transport.send(message)?;
        debug!(type_code, len = message.len(), "sent command");

        let mode = match timeout {
            Some(timeout) => ReceiveMode::Timeout(timeout),
            None => ReceiveMode::Blocking,
        };
        loop {
            if let Some(reply) = command.transport.receive(mode)? {
                debug!(type_code, len = reply.len(), "received command reply");
                return Ok(reply);
            }
            if let Some(timeout) = timeout {
                command.unanswered += 1;
                debug!(type_code, ?timeout, "command reply timed out");
                return Err(ControllerError::Timeout(timeout));
            }
        }
    }

    // --- Telemetry path ---

    /// Route every telemetry frame that is currently pending.
    ///
    /// Returns the number of frames taken off the channel. Individual bad
    /// frames are dropped and counted; only transport errors are returned.
    pub fn poll_once(&self) -> Result<usize> {
        let telemetry = self
            .telemetry
            .as_ref()
            .ok_or(ControllerError::NoTelemetryChannel)?;

        let mut drained = 0;
        loop {
            let message = lock(telemetry).receive(ReceiveMode::NonBlocking)?;
            let Some(message) = message else {
                break;
            };
            self.evaluate_telemetry(message);
            drained += 1;
        }
        Ok(drained)
    }

    /// Route one received telemetry message into the buffers.
    pub fn evaluate_telemetry(&self, message: Bytes) -> Routed {
        let routed = self.route(message);
        self.counters.record(routed);
        routed
    }

    fn route(&self, message: Bytes) -> Routed {
        let frame = match decode_frame(message) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%err, "dropping malformed telemetry frame");
                return Routed::Malformed;
            }
        };

        let code = frame.type_code;
        match self.buffers.push_serialized(code, &frame.payload) {
            Ok(()) => Routed::Buffered(code),
            Err(BufferError::NotRegistered { .. })
                if code == TelemetryType::SimpleSensorValue.code() =>
            {
                self.route_sensor(&frame.payload)
            }
            Err(BufferError::NotRegistered { .. }) => {
                debug!(
                    type_code = code,
                    kind = rrc_frame::telemetry_name(code),
                    "ignoring unbuffered telemetry type"
                );
                Routed::Ignored(code)
            }
            Err(err) => {
                debug!(type_code = code, %err, "dropping undecodable telemetry");
                Routed::DecodeFailed(code)
            }
        }
    }

    fn route_sensor(&self, payload: &[u8]) -> Routed {
        let reading = match self.config.wire_format.decode::<SimpleSensor>(payload) {
            Ok(reading) => reading,
            Err(err) => {
                debug!(%err, "dropping undecodable sensor reading");
                return Routed::DecodeFailed(TelemetryType::SimpleSensorValue.code());
            }
        };

        let id = reading.id;
        if id > self.config.max_sensor_id {
            debug!(
                sensor = id,
                max = self.config.max_sensor_id,
                "rejecting sensor reading with out-of-range id"
            );
            return Routed::SensorOutOfRange { id };
        }
        self.sensors.push(id as usize, reading);
        trace!(sensor = id, "buffered sensor reading");
        Routed::Sensor { id }
    }

    // --- Readers ---

    /// Latest value for `type_code`, serialized in the configured format.
    ///
    /// Empty when nothing has arrived yet.
    pub fn get_serialized(&self, type_code: u16) -> Result<Bytes> {
        Ok(self.buffers.peek_serialized(type_code)?)
    }

    /// Copy of the latest value for `type_code`.
    pub fn get_telemetry<T: Message>(&self, type_code: u16) -> Result<Option<T>> {
        Ok(self.buffers.peek_latest(type_code)?)
    }

    /// Remove and return the oldest value for `type_code`.
    pub fn pop_telemetry<T: Message>(&self, type_code: u16) -> Result<Option<T>> {
        Ok(self.buffers.pop_oldest(type_code)?)
    }

    pub fn current_pose(&self) -> Result<Option<Pose>> {
        self.latest(TelemetryType::CurrentPose)
    }

    pub fn joint_state(&self) -> Result<Option<JointState>> {
        self.latest(TelemetryType::JointState)
    }

    pub fn controllable_joints(&self) -> Result<Option<JointState>> {
        self.latest(TelemetryType::ControllableJoints)
    }

    pub fn simple_actions(&self) -> Result<Option<SimpleActions>> {
        self.latest(TelemetryType::SimpleActions)
    }

    pub fn complex_actions(&self) -> Result<Option<ComplexActions>> {
        self.latest(TelemetryType::ComplexActions)
    }

    pub fn robot_name(&self) -> Result<Option<RobotName>> {
        self.latest(TelemetryType::RobotName)
    }

    pub fn robot_state(&self) -> Result<Option<RobotState>> {
        self.latest(TelemetryType::RobotState)
    }

    /// Oldest unread log message. Log lines are consumed, not peeked.
    pub fn log_message(&self) -> Result<Option<LogMessage>> {
        self.pop_telemetry(TelemetryType::LogMessage.code())
    }

    pub fn video_streams(&self) -> Result<Option<VideoStreams>> {
        self.latest(TelemetryType::VideoStreams)
    }

    pub fn simple_sensor_definition(&self) -> Result<Option<SimpleSensors>> {
        self.latest(TelemetryType::SimpleSensorDefinition)
    }

    /// Latest reading of sensor `id`.
    pub fn simple_sensor(&self, id: u32) -> Option<SimpleSensor> {
        self.sensors.peek_latest(id as usize)
    }

    pub fn wrench_state(&self) -> Result<Option<WrenchState>> {
        self.latest(TelemetryType::WrenchState)
    }

    pub fn maps_definition(&self) -> Result<Option<MapsDefinition>> {
        self.latest(TelemetryType::MapsDefinition)
    }

    pub fn map(&self) -> Result<Option<Map>> {
        self.latest(TelemetryType::Map)
    }

    fn latest<T: Message>(&self, kind: TelemetryType) -> Result<Option<T>> {
        self.get_telemetry(kind.code())
    }
}

impl std::fmt::Debug for RobotController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotController")
            .field("config", &self.config)
            .field("buffers", &self.buffers)
            .field("sensors", &self.sensors.len())
            .field("has_telemetry", &self.has_telemetry())
            .finish()
    }
}

/// Check that a reply is a frame of `expected` and return its payload.
fn expect_frame(expected: u16, reply: Bytes) -> Result<Bytes> {
    let frame = decode_frame(reply)?;
    if frame.type_code != expected {
        return Err(ControllerError::UnexpectedReply {
            expected,
            found: frame.type_code,
        });
    }
    Ok(frame.payload)
}

fn lock(channel: &Channel) -> MutexGuard<'_, Box<dyn Transport>> {
    channel.lock().unwrap_or_else(PoisonError::into_inner)
}
