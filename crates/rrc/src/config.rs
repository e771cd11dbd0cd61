use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rrc_controller::{ControllerConfig, RobotController};
use rrc_frame::WireFormat;
use rrc_transport::{StreamTransport, TransportError, UnixDomainSocket};
use serde::Deserialize;

use crate::cmd::LinkArgs;
use crate::exit::{
    controller_error, io_error, transport_error, CliError, CliResult, DATA_INVALID, TIMEOUT, USAGE,
};

pub const DEFAULT_COMMAND_SOCKET: &str = "/tmp/rrc-command.sock";
pub const DEFAULT_TELEMETRY_SOCKET: &str = "/tmp/rrc-telemetry.sock";
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings read from `--config`. Every field is optional; flags win.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub command_socket: Option<PathBuf>,
    pub telemetry_socket: Option<PathBuf>,
    pub wire_format: Option<WireFormat>,
    pub buffer_size: Option<usize>,
    pub max_sensor_id: Option<u32>,
    pub command_timeout: Option<String>,
    pub connect_timeout: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        serde_json::from_str(&text).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("invalid config file {}: {err}", path.display()),
            )
        })
    }
}

/// Fully resolved link settings.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub command_socket: PathBuf,
    pub telemetry_socket: PathBuf,
    pub connect_timeout: Duration,
    pub controller: ControllerConfig,
}

impl LinkSettings {
    pub fn resolve(args: &LinkArgs) -> CliResult<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let command_timeout = match args.timeout.as_deref().or(file.command_timeout.as_deref()) {
            Some(input) => parse_duration(input)?,
            None => DEFAULT_COMMAND_TIMEOUT,
        };
        let connect_timeout = match file.connect_timeout.as_deref() {
            Some(input) => parse_duration(input)?,
            None => DEFAULT_CONNECT_TIMEOUT,
        };

        let controller = ControllerConfig {
            buffer_size: args
                .buffer_size
                .or(file.buffer_size)
                .unwrap_or(rrc_controller::DEFAULT_BUFFER_SIZE),
            wire_format: args.wire_format.or(file.wire_format).unwrap_or_default(),
            command_timeout: Some(command_timeout),
            max_sensor_id: file
                .max_sensor_id
                .unwrap_or(rrc_controller::DEFAULT_MAX_SENSOR_ID),
            ..ControllerConfig::default()
        };
        controller
            .validate()
            .map_err(|err| controller_error("invalid settings", err))?;

        Ok(Self {
            command_socket: args
                .command_socket
                .clone()
                .or(file.command_socket)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMMAND_SOCKET)),
            telemetry_socket: args
                .telemetry_socket
                .clone()
                .or(file.telemetry_socket)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TELEMETRY_SOCKET)),
            connect_timeout,
            controller,
        })
    }

    /// Connect to the robot. The telemetry channel is only opened on request.
    pub fn connect(&self, with_telemetry: bool) -> CliResult<RobotController> {
        let command = connect_with_timeout(&self.command_socket, self.connect_timeout)?;
        let telemetry = if with_telemetry {
            Some(connect_with_timeout(
                &self.telemetry_socket,
                self.connect_timeout,
            )?)
        } else {
            None
        };

        RobotController::new(
            Box::new(command),
            telemetry.map(|t| Box::new(t) as Box<dyn rrc_transport::Transport>),
            self.controller.clone(),
        )
        .map_err(|err| controller_error("controller setup failed", err))
    }
}

fn connect_with_timeout(path: &Path, timeout: Duration) -> CliResult<StreamTransport> {
    let start = Instant::now();
    loop {
        match UnixDomainSocket::connect(path) {
            Ok(transport) => return Ok(transport),
            Err(err) => {
                if !is_retryable_connect_error(&err) {
                    return Err(transport_error("connect failed", err));
                }
                if start.elapsed() >= timeout {
                    return Err(CliError::new(
                        TIMEOUT,
                        format!("connect to {} timed out after {timeout:?}", path.display()),
                    ));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

fn is_retryable_connect_error(err: &TransportError) -> bool {
    match err {
        TransportError::Connect { source, .. } => {
            source.kind() == std::io::ErrorKind::NotFound
                || source.kind() == std::io::ErrorKind::ConnectionRefused
        }
        _ => false,
    }
}

/// Parse `5s`, `150ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
