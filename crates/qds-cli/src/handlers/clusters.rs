//! Cluster subcommand handlers

use crate::cli::{ClusterAction, ClusterArgs};
use crate::error::Result;
use crate::handlers::resources::handle_crud;
use crate::output::OutputWriter;
use qds_core::{ClusterApi, Session};

/// Handle the cluster command
pub async fn handle_cluster(
    args: ClusterArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let api = ClusterApi::for_session(session)?;

    match args.action {
        ClusterAction::Crud(action) => handle_crud(&api, action, output).await,
        ClusterAction::Start(target) => {
            let response = api.start(&target.id).await?;
            output.success(&format!("Start requested for cluster {}", target.id))?;
            output.data(&response)
        }
        ClusterAction::Terminate(target) => {
            let response = api.terminate(&target.id).await?;
            output.success(&format!("Terminate requested for cluster {}", target.id))?;
            output.data(&response)
        }
        ClusterAction::Status(target) => output.data(&api.state(&target.id).await?),
    }
}
