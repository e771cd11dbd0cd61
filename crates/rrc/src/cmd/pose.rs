use rrc_frame::CommandType;
use rrc_messages::{Orientation, Pose, Vector3};

use crate::cmd::PoseArgs;
use crate::config::LinkSettings;
use crate::exit::{controller_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: PoseArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = settings.connect(false)?;

    let pose = Pose::new(
        Vector3::new(args.x, args.y, args.z),
        Orientation::from_yaw(args.yaw),
    );
    let reply = controller
        .set_target_pose(&pose)
        .map_err(|err| controller_error("target pose command failed", err))?;

    let kind = CommandType::TargetPoseCommand;
    print_reply(kind.name(), kind.code(), &reply, format);
    Ok(SUCCESS)
}
