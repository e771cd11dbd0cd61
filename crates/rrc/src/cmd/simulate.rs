use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use rrc_frame::{
    decode_frame, decode_log_level, decode_request_code, encode_frame, CommandType, FrameError,
    LogLevel, MapType, TelemetryType, WireFormat,
};
use rrc_messages::{
    ComplexAction, GoTo, JointState, LogMessage, Map, MapDefinition, MapsDefinition, Orientation,
    Pose, RobotName, RobotState, SimpleActions, SimpleSensor, SimpleSensors, Twist, Vector2,
    Vector3,
};
use rrc_transport::{ReceiveMode, Transport, TransportError, UnixDomainSocket};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cmd::SimulateArgs;
use crate::config::{parse_duration, LinkSettings};
use crate::exit::{transport_error, CliResult};

const BATTERY_SENSOR: u32 = 0;

/// State of the simulated robot.
struct SimRobot {
    name: String,
    pose: Pose,
    twist: Twist,
    joints: JointState,
    log_level: LogLevel,
    logs: Vec<LogMessage>,
    battery: f32,
}

impl SimRobot {
    fn new(name: String) -> Self {
        Self {
            name,
            pose: Pose::default(),
            twist: Twist::default(),
            joints: JointState::positions([("pan", 0.0), ("tilt", 0.0)]),
            log_level: LogLevel::INFO,
            logs: Vec::new(),
            battery: 100.0,
        }
    }

    fn log(&mut self, level: LogLevel, message: String) {
        if level <= self.log_level {
            self.logs.push(LogMessage {
                level: level.0,
                message,
            });
        }
    }

    fn step(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();
        self.pose.position.x += self.twist.linear.x * dt;
        self.pose.position.y += self.twist.linear.y * dt;
        self.pose.position.z += self.twist.linear.z * dt;
        self.battery = (self.battery - 0.01).max(0.0);
    }

    /// Apply one command frame and build the reply.
    fn handle(&mut self, message: Bytes, format: WireFormat) -> Result<Vec<u8>, FrameError> {
        let frame = decode_frame(message)?;
        let kind = CommandType::from_code(frame.type_code);
        info!(
            type_code = frame.type_code,
            command = kind.map_or("UNKNOWN", CommandType::name),
            size = frame.payload.len(),
            "command received"
        );

        match kind {
            Some(CommandType::TargetPoseCommand) => {
                self.pose = format.decode(&frame.payload)?;
                self.log(LogLevel::INFO, "target pose reached".to_string());
            }
            Some(CommandType::TwistCommand) => {
                self.twist = format.decode(&frame.payload)?;
            }
            Some(CommandType::JointsCommand) => {
                let target: JointState = format.decode(&frame.payload)?;
                for (name, position) in target.name.iter().zip(&target.position) {
                    if let Some(index) = self.joints.name.iter().position(|n| n == name) {
                        self.joints.position[index] = *position;
                    }
                }
            }
            Some(CommandType::SimpleActionsCommand) => {
                let actions: SimpleActions = format.decode(&frame.payload)?;
                for action in actions.actions {
                    self.log(
                        LogLevel::INFO,
                        format!("action {} -> {}", action.name, action.state),
                    );
                }
            }
            Some(CommandType::ComplexActionCommand) => {
                let action: ComplexAction = format.decode(&frame.payload)?;
                self.log(
                    LogLevel::INFO,
                    format!("complex action {} with {} poses", action.name, action.poses.len()),
                );
            }
            Some(CommandType::GotoCommand) => {
                let goto: GoTo = format.decode(&frame.payload)?;
                self.pose = goto.waypoint_pose;
            }
            Some(CommandType::LogLevelSelect) => {
                self.log_level = LogLevel(decode_log_level(&frame)?);
                self.log(
                    LogLevel::INFO,
                    format!("log level set to {}", self.log_level.0),
                );
            }
            Some(CommandType::TelemetryRequest) => {
                let code = decode_request_code(&frame.payload)?;
                return self.telemetry_frame(code, format);
            }
            Some(CommandType::MapRequest) => {
                let map_type = decode_request_code(&frame.payload)?;
                return self.map_frame(map_type, format);
            }
            Some(CommandType::NoControlData) | None => {}
        }
        Ok(Vec::new())
    }

    /// Current value of one telemetry type, framed with its code.
    fn telemetry_frame(&self, code: u16, format: WireFormat) -> Result<Vec<u8>, FrameError> {
        match TelemetryType::from_code(code) {
            Some(TelemetryType::CurrentPose) => frame(code, &self.pose, format),
            Some(TelemetryType::JointState | TelemetryType::ControllableJoints) => {
                frame(code, &self.joints, format)
            }
            Some(TelemetryType::RobotName) => frame(
                code,
                &RobotName {
                    value: self.name.clone(),
                },
                format,
            ),
            Some(TelemetryType::RobotState) => frame(
                code,
                &RobotState {
                    state: vec![
                        format!("log_level={}", self.log_level.0),
                        format!("battery={:.1}", self.battery),
                    ],
                },
                format,
            ),
            Some(TelemetryType::SimpleSensorDefinition) => frame(
                code,
                &SimpleSensors {
                    sensors: vec![SimpleSensor {
                        id: BATTERY_SENSOR,
                        name: "battery".to_string(),
                        size: Vector2::new(1.0, 1.0),
                        scale: Vector2::new(1.0, 1.0),
                        value: Vec::new(),
                    }],
                },
                format,
            ),
            Some(TelemetryType::MapsDefinition) => frame(
                code,
                &MapsDefinition {
                    maps: vec![MapDefinition {
                        map_type: MapType::PointcloudMap.code(),
                        name: "surroundings".to_string(),
                    }],
                },
                format,
            ),
            _ => {
                debug!(type_code = code, "no simulated value for telemetry request");
                Ok(TelemetryType::NoTelemetryData.code().to_le_bytes().to_vec())
            }
        }
    }

    fn map_frame(&self, map_type: u16, format: WireFormat) -> Result<Vec<u8>, FrameError> {
        let points = if map_type == MapType::PointcloudMap.code() {
            (0..8)
                .map(|i| {
                    let angle = f64::from(i) * std::f64::consts::FRAC_PI_4;
                    Vector3::new(angle.cos() * 2.0, angle.sin() * 2.0, 0.0)
                })
                .collect()
        } else {
            Vec::new()
        };
        let map = Map {
            map_type,
            origin: Pose::new(Vector3::default(), Orientation::IDENTITY),
            points,
        };
        frame(TelemetryType::Map.code(), &map, format)
    }

    /// Frames published on every telemetry tick.
    fn telemetry_tick(&mut self, format: WireFormat) -> Result<Vec<Vec<u8>>, FrameError> {
        let mut frames = vec![
            frame(TelemetryType::CurrentPose.code(), &self.pose, format)?,
            frame(TelemetryType::JointState.code(), &self.joints, format)?,
            frame(
                TelemetryType::SimpleSensorValue.code(),
                &SimpleSensor::reading(BATTERY_SENSOR, vec![self.battery]),
                format,
            )?,
        ];
        for log in self.logs.drain(..) {
            frames.push(frame(TelemetryType::LogMessage.code(), &log, format)?);
        }
        Ok(frames)
    }
}

fn frame<T: Serialize>(code: u16, value: &T, format: WireFormat) -> Result<Vec<u8>, FrameError> {
    let payload = format.encode(value)?;
    let mut buf = BytesMut::new();
    encode_frame(code, &payload, &mut buf);
    Ok(buf.to_vec())
}

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let period = parse_duration(&args.period)?;
    let settings = LinkSettings::resolve(&args.link)?;
    let format = settings.controller.wire_format;

    let telemetry_listener = UnixDomainSocket::bind(&settings.telemetry_socket)
        .map_err(|err| transport_error("telemetry bind failed", err))?;
    let command_listener = UnixDomainSocket::bind(&settings.command_socket)
        .map_err(|err| transport_error("command bind failed", err))?;
    info!(
        command = %settings.command_socket.display(),
        telemetry = %settings.telemetry_socket.display(),
        %format,
        "simulated robot listening"
    );

    let robot = Arc::new(Mutex::new(SimRobot::new(args.name)));

    {
        let robot = Arc::clone(&robot);
        thread::spawn(move || publish(&telemetry_listener, &robot, format, period));
    }

    loop {
        let mut channel = command_listener
            .accept()
            .map_err(|err| transport_error("command accept failed", err))?;
        debug!("operator connected on command channel");
        serve(&mut channel, &robot, format);
    }
}

/// Answer commands on one connection until the operator disconnects.
fn serve(channel: &mut impl Transport, robot: &Mutex<SimRobot>, format: WireFormat) {
    loop {
        let message = match channel.receive(ReceiveMode::Blocking) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(TransportError::Shutdown) => {
                debug!("operator disconnected from command channel");
                return;
            }
            Err(err) => {
                warn!(%err, "command receive failed");
                return;
            }
        };

        let reply = robot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle(message, format)
            .unwrap_or_else(|err| {
                warn!(%err, "rejecting command");
                Vec::new()
            });
        if let Err(err) = channel.send(&reply) {
            warn!(%err, "command reply failed");
            return;
        }
    }
}

/// Publish telemetry to each connecting operator in turn.
fn publish(
    listener: &UnixDomainSocket,
    robot: &Mutex<SimRobot>,
    format: WireFormat,
    period: Duration,
) {
    loop {
        let mut channel = match listener.accept() {
            Ok(channel) => channel,
            Err(err) => {
                warn!(%err, "telemetry accept failed");
                return;
            }
        };
        debug!("operator connected on telemetry channel");

        'session: loop {
            let frames = {
                let mut robot = robot.lock().unwrap_or_else(PoisonError::into_inner);
                robot.step(period);
                robot.telemetry_tick(format)
            };
            match frames {
                Ok(frames) => {
                    for frame in frames {
                        if let Err(err) = channel.send(&frame) {
                            debug!(%err, "telemetry session ended");
                            break 'session;
                        }
                    }
                }
                Err(err) => warn!(%err, "telemetry encode failed"),
            }
            thread::sleep(period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command<T: Serialize>(kind: CommandType, value: &T) -> Bytes {
        Bytes::from(frame(kind.code(), value, WireFormat::Postcard).expect("frame"))
    }

    #[test]
    fn twist_moves_robot() {
        let mut robot = SimRobot::new("sim".to_string());
        let twist = Twist {
            linear: Vector3::new(1.0, 0.0, 0.0),
            ..Twist::default()
        };
        let reply = robot
            .handle(command(CommandType::TwistCommand, &twist), WireFormat::Postcard)
            .expect("twist accepted");
        assert!(reply.is_empty());

        robot.step(Duration::from_millis(500));
        assert!((robot.pose.position.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn telemetry_request_replies_with_frame() {
        let mut robot = SimRobot::new("rover".to_string());
        let request = Bytes::from_static(&[0x07, 0x00, 0x06, 0x00]);
        let reply = robot
            .handle(request, WireFormat::Postcard)
            .expect("request accepted");

        let frame = decode_frame(Bytes::from(reply)).expect("reply is a frame");
        assert_eq!(frame.type_code, TelemetryType::RobotName.code());
        let name: RobotName = WireFormat::Postcard
            .decode(&frame.payload)
            .expect("name decodes");
        assert_eq!(name.value, "rover");
    }

    #[test]
    fn log_level_changes_filtering() {
        let mut robot = SimRobot::new("sim".to_string());
        let request = Bytes::from_static(&[0x08, 0x00, 0x02, 0x00, 0x00, 0x00]);
        robot
            .handle(request, WireFormat::Postcard)
            .expect("level accepted");
        assert_eq!(robot.log_level, LogLevel::ERROR);

        // The confirmation itself is INFO and filtered out at ERROR.
        assert!(robot.logs.is_empty());
    }

    #[test]
    fn tick_drains_pending_logs() {
        let mut robot = SimRobot::new("sim".to_string());
        robot.log(LogLevel::WARN, "low battery".to_string());
        let frames = robot.telemetry_tick(WireFormat::Postcard).expect("tick");
        assert_eq!(frames.len(), 4);
        assert!(robot.logs.is_empty());
    }
}
