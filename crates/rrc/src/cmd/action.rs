use rrc_frame::CommandType;
use rrc_messages::SimpleAction;

use crate::cmd::ActionArgs;
use crate::config::LinkSettings;
use crate::exit::{controller_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: ActionArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = settings.connect(false)?;

    let action = SimpleAction::new(args.name, args.state);
    let reply = controller
        .set_simple_action_command(&action)
        .map_err(|err| controller_error("action command failed", err))?;

    let kind = CommandType::SimpleActionsCommand;
    print_reply(kind.name(), kind.code(), &reply, format);
    Ok(SUCCESS)
}
