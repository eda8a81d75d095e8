//! Group subcommand handlers

use crate::cli::{GroupAction, GroupArgs};
use crate::error::Result;
use crate::handlers::resources::handle_crud;
use crate::output::OutputWriter;
use qds_core::{GroupApi, Session};

/// Handle the group command
pub async fn handle_group(
    args: GroupArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let api = GroupApi::for_session(session)?;

    match args.action {
        GroupAction::Crud(action) => handle_crud(&api, action, output).await,
        GroupAction::AddUsers(members) => {
            output.data(&api.add_users(&members.id, &members.users).await?)
        }
        GroupAction::RemoveUsers(members) => {
            output.data(&api.remove_users(&members.id, &members.users).await?)
        }
    }
}
