use rrc_frame::TelemetryType;

use crate::cmd::RequestArgs;
use crate::config::LinkSettings;
use crate::exit::{buffer_error, controller_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_value, OutputFormat};

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let kind = parse_telemetry(&args.telemetry)?;
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = settings.connect(false)?;

    controller
        .request_telemetry_into_buffer(kind)
        .map_err(|err| controller_error("telemetry request failed", err))?;

    let value = controller
        .buffers()
        .peek_json(kind.code())
        .map_err(|err| buffer_error("telemetry read failed", err))?
        .unwrap_or(serde_json::Value::Null);

    print_value(kind.name(), &value, format);
    Ok(SUCCESS)
}

fn parse_telemetry(input: &str) -> CliResult<TelemetryType> {
    let kind = TelemetryType::from_name(input)
        .or_else(|| input.parse().ok().and_then(TelemetryType::from_code))
        .ok_or_else(|| CliError::new(USAGE, format!("unknown telemetry type '{input}'")))?;

    match kind {
        TelemetryType::NoTelemetryData | TelemetryType::SimpleSensorValue => Err(CliError::new(
            USAGE,
            format!("{} cannot be requested", kind.name()),
        )),
        kind => Ok(kind),
    }
}
