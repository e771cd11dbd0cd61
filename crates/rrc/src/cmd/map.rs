use rrc_frame::{MapType, WireFormat};

use crate::cmd::MapArgs;
use crate::config::LinkSettings;
use crate::exit::{controller_error, frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_value, OutputFormat};

pub fn run(args: MapArgs, format: OutputFormat) -> CliResult<i32> {
    let map_type = MapType::from_code(args.map_type)
        .ok_or_else(|| CliError::new(USAGE, format!("unknown map type {}", args.map_type)))?;
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = settings.connect(false)?;

    let map = controller
        .request_map(map_type)
        .map_err(|err| controller_error("map request failed", err))?;
    let value = WireFormat::to_json(&map).map_err(|err| frame_error("map render failed", err))?;

    print_value("MAP", &value, format);
    Ok(SUCCESS)
}
