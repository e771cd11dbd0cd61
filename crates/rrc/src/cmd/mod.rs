use std::path::PathBuf;

use clap::{Args, Subcommand};
use rrc_frame::WireFormat;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod action;
pub mod log_level;
pub mod map;
pub mod pose;
pub mod request;
pub mod simulate;
pub mod twist;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a target pose command.
    Pose(PoseArgs),
    /// Send a velocity command.
    Twist(TwistArgs),
    /// Trigger a simple action.
    Action(ActionArgs),
    /// Select the robot's log verbosity.
    LogLevel(LogLevelArgs),
    /// Request one telemetry value and print it.
    Request(RequestArgs),
    /// Request a map and print it.
    Map(MapArgs),
    /// Ingest telemetry and print the latest values.
    Watch(WatchArgs),
    /// Run a simulated robot on the command and telemetry sockets.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Pose(args) => pose::run(args, format),
        Command::Twist(args) => twist::run(args, format),
        Command::Action(args) => action::run(args, format),
        Command::LogLevel(args) => log_level::run(args, format),
        Command::Request(args) => request::run(args, format),
        Command::Map(args) => map::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Simulate(args) => simulate::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Where the robot is and how to talk to it.
#[derive(Args, Debug, Default, Clone)]
pub struct LinkArgs {
    /// Command channel socket path.
    #[arg(long, value_name = "PATH", env = "RRC_COMMAND_SOCKET")]
    pub command_socket: Option<PathBuf>,
    /// Telemetry channel socket path.
    #[arg(long, value_name = "PATH", env = "RRC_TELEMETRY_SOCKET")]
    pub telemetry_socket: Option<PathBuf>,
    /// Payload wire format shared with the robot (postcard, json).
    #[arg(long, value_name = "FORMAT")]
    pub wire_format: Option<WireFormat>,
    /// Values kept per telemetry type.
    #[arg(long, value_name = "N")]
    pub buffer_size: Option<usize>,
    /// Command reply timeout (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,
    /// JSON settings file; flags take precedence.
    #[arg(long, value_name = "FILE", env = "RRC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PoseArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub y: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub z: f64,
    /// Heading in radians.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub yaw: f64,
}

#[derive(Args, Debug)]
pub struct TwistArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Forward velocity in m/s.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub linear_x: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub linear_y: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub linear_z: f64,
    /// Turn rate in rad/s.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub angular_z: f64,
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Action name, as advertised by the robot.
    pub name: String,
    /// Action value (1 = on, 0 = off for triggers).
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub state: f32,
}

#[derive(Args, Debug)]
pub struct LogLevelArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// none, fatal, error, warn, info, debug, custom+N or a number.
    pub level: String,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Telemetry type name (e.g. robot_name, current_pose).
    pub telemetry: String,
}

#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Map type code.
    #[arg(long, default_value_t = 1)]
    pub map_type: u16,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Time between snapshots (e.g. 1s, 200ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Exit after N snapshots.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Robot name reported in telemetry.
    #[arg(long, default_value = "sim")]
    pub name: String,
    /// Telemetry publish period (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub period: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
