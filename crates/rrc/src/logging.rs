use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Workspace crates whose events follow `--log-level`. Everything else
/// stays at `warn` unless `RUST_LOG` says otherwise.
const LINK_CRATES: [&str; 6] = [
    "rrc",
    "rrc_transport",
    "rrc_frame",
    "rrc_buffer",
    "rrc_controller",
    "rrc_messages",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Verbosity of the operator-side log on stderr.
///
/// Not to be confused with the robot's log level, which `rrc log-level`
/// selects on the robot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn as_str(self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }

    /// `EnvFilter` directive applying this verbosity to the link crates.
    pub fn directive(self) -> String {
        let level = self.as_str();
        LINK_CRATES
            .iter()
            .fold(String::from("warn"), |mut directive, krate| {
                directive.push_str(&format!(",{krate}={level}"));
                directive
            })
    }
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(format: LogFormat, verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true);

    let installed = match format {
        LogFormat::Text => subscriber.with_target(false).try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
    if let Err(err) = installed {
        eprintln!("warning: logging already initialized: {err}");
    }
}
