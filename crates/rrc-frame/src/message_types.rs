//! Type codes carried in the first two bytes of every frame.
//!
//! Values are part of the wire contract. Each enumeration reserves zero for
//! "no data" and ends with a sentinel (`SENTINEL`) that only sizes tables
//! and is never sent.

/// Operator-to-robot frame types (command channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CommandType {
    NoControlData = 0,
    /// Target pose the robot should move to.
    TargetPoseCommand = 1,
    /// Direct velocity command for the robot base.
    TwistCommand = 2,
    JointsCommand = 3,
    SimpleActionsCommand = 4,
    ComplexActionCommand = 5,
    GotoCommand = 6,
    TelemetryRequest = 7,
    LogLevelSelect = 8,
    MapRequest = 9,
}

impl CommandType {
    /// One past the highest command code.
    pub const SENTINEL: u16 = 10;

    const ALL: [CommandType; 10] = [
        CommandType::NoControlData,
        CommandType::TargetPoseCommand,
        CommandType::TwistCommand,
        CommandType::JointsCommand,
        CommandType::SimpleActionsCommand,
        CommandType::ComplexActionCommand,
        CommandType::GotoCommand,
        CommandType::TelemetryRequest,
        CommandType::LogLevelSelect,
        CommandType::MapRequest,
    ];

    /// Wire value.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Look up a wire value. The sentinel and unknown codes map to `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// All command types in code order.
    pub fn all() -> &'static [CommandType] {
        &Self::ALL
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            CommandType::NoControlData => "NO_CONTROL_DATA",
            CommandType::TargetPoseCommand => "TARGET_POSE_COMMAND",
            CommandType::TwistCommand => "TWIST_COMMAND",
            CommandType::JointsCommand => "JOINTS_COMMAND",
            CommandType::SimpleActionsCommand => "SIMPLE_ACTIONS_COMMAND",
            CommandType::ComplexActionCommand => "COMPLEX_ACTION_COMMAND",
            CommandType::GotoCommand => "GOTO_COMMAND",
            CommandType::TelemetryRequest => "TELEMETRY_REQUEST",
            CommandType::LogLevelSelect => "LOG_LEVEL_SELECT",
            CommandType::MapRequest => "MAP_REQUEST",
        }
    }
}

/// Robot-to-operator frame types (telemetry channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TelemetryType {
    NoTelemetryData = 0,
    /// Current pose of the robot base.
    CurrentPose = 1,
    /// Current joint values.
    JointState = 2,
    /// Joints the operator may command.
    ControllableJoints = 3,
    SimpleActions = 4,
    ComplexActions = 5,
    RobotName = 6,
    RobotState = 7,
    LogMessage = 8,
    VideoStreams = 9,
    /// Definitions of the available simple sensors.
    SimpleSensorDefinition = 10,
    /// One reading of one simple sensor; many sensors share this code.
    SimpleSensorValue = 11,
    WrenchState = 12,
    MapsDefinition = 13,
    Map = 14,
}

impl TelemetryType {
    /// One past the highest telemetry code.
    pub const SENTINEL: u16 = 15;

    const ALL: [TelemetryType; 15] = [
        TelemetryType::NoTelemetryData,
        TelemetryType::CurrentPose,
        TelemetryType::JointState,
        TelemetryType::ControllableJoints,
        TelemetryType::SimpleActions,
        TelemetryType::ComplexActions,
        TelemetryType::RobotName,
        TelemetryType::RobotState,
        TelemetryType::LogMessage,
        TelemetryType::VideoStreams,
        TelemetryType::SimpleSensorDefinition,
        TelemetryType::SimpleSensorValue,
        TelemetryType::WrenchState,
        TelemetryType::MapsDefinition,
        TelemetryType::Map,
    ];

    /// Wire value.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Look up a wire value. The sentinel and unknown codes map to `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Look up by name, case-insensitively (`current_pose`, `CURRENT_POSE`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// All telemetry types in code order.
    pub fn all() -> &'static [TelemetryType] {
        &Self::ALL
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            TelemetryType::NoTelemetryData => "NO_TELEMETRY_DATA",
            TelemetryType::CurrentPose => "CURRENT_POSE",
            TelemetryType::JointState => "JOINT_STATE",
            TelemetryType::ControllableJoints => "CONTROLLABLE_JOINTS",
            TelemetryType::SimpleActions => "SIMPLE_ACTIONS",
            TelemetryType::ComplexActions => "COMPLEX_ACTIONS",
            TelemetryType::RobotName => "ROBOT_NAME",
            TelemetryType::RobotState => "ROBOT_STATE",
            TelemetryType::LogMessage => "LOG_MESSAGE",
            TelemetryType::VideoStreams => "VIDEO_STREAMS",
            TelemetryType::SimpleSensorDefinition => "SIMPLE_SENSOR_DEFINITION",
            TelemetryType::SimpleSensorValue => "SIMPLE_SENSOR_VALUE",
            TelemetryType::WrenchState => "WRENCH_STATE",
            TelemetryType::MapsDefinition => "MAPS_DEFINITION",
            TelemetryType::Map => "MAP",
        }
    }
}

/// Name for a raw telemetry code, including out-of-range ones.
pub fn telemetry_name(code: u16) -> &'static str {
    match TelemetryType::from_code(code) {
        Some(kind) => kind.name(),
        None if code == TelemetryType::SENTINEL => "SENTINEL",
        None => "UNKNOWN",
    }
}

/// Map sub-family, requested with [`CommandType::MapRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MapType {
    NoMapData = 0,
    PointcloudMap = 1,
}

impl MapType {
    /// One past the highest map code.
    pub const SENTINEL: u16 = 2;

    /// Wire value.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Look up a wire value.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(MapType::NoMapData),
            1 => Some(MapType::PointcloudMap),
            _ => None,
        }
    }
}

/// Robot log verbosity selected with [`CommandType::LogLevelSelect`].
///
/// Levels above [`LogLevel::CUSTOM`] are application defined (`CUSTOM + x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogLevel(pub u32);

impl LogLevel {
    pub const NONE: LogLevel = LogLevel(0);
    pub const FATAL: LogLevel = LogLevel(1);
    pub const ERROR: LogLevel = LogLevel(2);
    pub const WARN: LogLevel = LogLevel(3);
    pub const INFO: LogLevel = LogLevel(4);
    pub const DEBUG: LogLevel = LogLevel(5);
    pub const CUSTOM: LogLevel = LogLevel(20);

    /// An application-defined level `CUSTOM + offset`.
    pub const fn custom(offset: u32) -> Self {
        LogLevel(Self::CUSTOM.0 + offset)
    }

    /// Parse `none`, `fatal`, `error`, `warn`, `info`, `debug`,
    /// `custom+N`, or a bare number.
    pub fn parse(input: &str) -> Option<Self> {
        let lower = input.trim().to_ascii_lowercase();
        let level = match lower.as_str() {
            "none" => Self::NONE,
            "fatal" => Self::FATAL,
            "error" => Self::ERROR,
            "warn" | "warning" => Self::WARN,
            "info" => Self::INFO,
            "debug" => Self::DEBUG,
            "custom" => Self::CUSTOM,
            other => match other.strip_prefix("custom+") {
                Some(offset) => Self::custom(offset.parse().ok()?),
                None => LogLevel(other.parse().ok()?),
            },
        };
        Some(level)
    }
}

impl From<u32> for LogLevel {
    fn from(level: u32) -> Self {
        LogLevel(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_wire_contract() {
        assert_eq!(CommandType::NoControlData.code(), 0);
        assert_eq!(CommandType::TargetPoseCommand.code(), 1);
        assert_eq!(CommandType::TelemetryRequest.code(), 7);
        assert_eq!(CommandType::LogLevelSelect.code(), 8);
        assert_eq!(CommandType::MapRequest.code(), 9);
        assert_eq!(CommandType::all().len(), usize::from(CommandType::SENTINEL));
    }

    #[test]
    fn telemetry_codes_match_wire_contract() {
        assert_eq!(TelemetryType::CurrentPose.code(), 1);
        assert_eq!(TelemetryType::SimpleSensorValue.code(), 11);
        assert_eq!(TelemetryType::WrenchState.code(), 12);
        assert_eq!(TelemetryType::Map.code(), 14);
        assert_eq!(
            TelemetryType::all().len(),
            usize::from(TelemetryType::SENTINEL)
        );
    }

    #[test]
    fn from_code_covers_every_variant() {
        for kind in TelemetryType::all() {
            assert_eq!(TelemetryType::from_code(kind.code()), Some(*kind));
        }
        for kind in CommandType::all() {
            assert_eq!(CommandType::from_code(kind.code()), Some(*kind));
        }
    }

    #[test]
    fn sentinel_and_unknown_codes_have_no_variant() {
        assert_eq!(TelemetryType::from_code(TelemetryType::SENTINEL), None);
        assert_eq!(TelemetryType::from_code(900), None);
        assert_eq!(CommandType::from_code(CommandType::SENTINEL), None);
        assert_eq!(MapType::from_code(MapType::SENTINEL), None);
        assert_eq!(telemetry_name(TelemetryType::SENTINEL), "SENTINEL");
        assert_eq!(telemetry_name(u16::MAX), "UNKNOWN");
    }

    #[test]
    fn telemetry_lookup_by_name() {
        assert_eq!(
            TelemetryType::from_name("current_pose"),
            Some(TelemetryType::CurrentPose)
        );
        assert_eq!(TelemetryType::from_name("MAP"), Some(TelemetryType::Map));
        assert_eq!(TelemetryType::from_name("pose"), None);
    }

    #[test]
    fn log_level_parsing() {
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::WARN));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::DEBUG));
        assert_eq!(LogLevel::parse("3"), Some(LogLevel(3)));
        assert_eq!(LogLevel::parse("custom+2"), Some(LogLevel(22)));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
