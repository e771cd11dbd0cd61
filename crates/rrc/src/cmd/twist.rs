use rrc_frame::CommandType;
use rrc_messages::{Twist, Vector3};

use crate::cmd::TwistArgs;
use crate::config::LinkSettings;
use crate::exit::{controller_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: TwistArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = settings.connect(false)?;

    let twist = Twist {
        linear: Vector3::new(args.linear_x, args.linear_y, args.linear_z),
        angular: Vector3::new(0.0, 0.0, args.angular_z),
    };
    let reply = controller
        .set_twist_command(&twist)
        .map_err(|err| controller_error("twist command failed", err))?;

    let kind = CommandType::TwistCommand;
    print_reply(kind.name(), kind.code(), &reply, format);
    Ok(SUCCESS)
}
