use rrc_frame::{CommandType, LogLevel};

use crate::cmd::LogLevelArgs;
use crate::config::LinkSettings;
use crate::exit::{controller_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: LogLevelArgs, format: OutputFormat) -> CliResult<i32> {
    let level = parse_level(&args.level)?;
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = settings.connect(false)?;

    tracing::debug!(level = level.0, "selecting robot log level");
    let reply = controller
        .set_log_level(level)
        .map_err(|err| controller_error("log level command failed", err))?;

    let kind = CommandType::LogLevelSelect;
    print_reply(kind.name(), kind.code(), &reply, format);
    Ok(SUCCESS)
}

fn parse_level(input: &str) -> CliResult<LogLevel> {
    LogLevel::parse(input).ok_or_else(|| {
        CliError::new(
            USAGE,
            format!("invalid log level '{input}' (expected none, fatal, error, warn, info, debug, custom+N or a number)"),
        )
    })
}
