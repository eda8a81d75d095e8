//! Generic create/read/update/delete handlers

use crate::cli::CrudAction;
use crate::error::Result;
use crate::handlers::utils;
use crate::output::OutputWriter;
use qds_core::ResourceApi;

/// Run one CRUD action against a resource collection
pub async fn handle_crud(
    api: &ResourceApi,
    action: CrudAction,
    output: &mut OutputWriter,
) -> Result<()> {
    match action {
        CrudAction::List(list) => output.data(&api.list(&utils::list_params(&list)).await?),
        CrudAction::Show(target) => output.data(&api.find(&target.id).await?),
        CrudAction::Create(payload) => {
            let body = utils::require_payload(&payload)?;
            let created = api.create(&body).await?;
            output.success(&format!(
                "Created {} {}",
                api.kind(),
                created.id().unwrap_or_default()
            ))?;
            output.data(&created)
        }
        CrudAction::Update { id, payload } => {
            let body = utils::require_payload(&payload)?;
            let updated = api.update(&id, &body).await?;
            output.success(&format!("Updated {} {}", api.kind(), id))?;
            output.data(&updated)
        }
        CrudAction::Delete(target) => {
            let response = api.delete(&target.id).await?;
            output.success(&format!("Deleted {} {}", api.kind(), target.id))?;
            if response.is_null() {
                Ok(())
            } else {
                output.data(&response)
            }
        }
    }
}
