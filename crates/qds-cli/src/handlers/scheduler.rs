//! Scheduler subcommand handlers

use crate::cli::{SchedulerAction, SchedulerArgs};
use crate::error::Result;
use crate::handlers::resources::handle_crud;
use crate::handlers::utils;
use crate::output::OutputWriter;
use qds_core::{ScheduleApi, Session};

/// Handle the scheduler command
pub async fn handle_scheduler(
    args: SchedulerArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let api = ScheduleApi::for_session(session)?;

    match args.action {
        SchedulerAction::Crud(action) => handle_crud(&api, action, output).await,
        SchedulerAction::Suspend(target) => output.data(&api.suspend(&target.id).await?),
        SchedulerAction::Resume(target) => output.data(&api.resume(&target.id).await?),
        SchedulerAction::Kill(target) => output.data(&api.kill(&target.id).await?),
        SchedulerAction::ListInstances { id, list } => {
            output.data(&api.list_instances(&id, &utils::list_params(&list)).await?)
        }
    }
}
