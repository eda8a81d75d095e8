//! Command (job) subcommand handlers

use crate::cli::{CommandAction, CommandArgs, SubmitArgs};
use crate::error::{Error, Result};
use crate::handlers::utils;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use qds_core::{CommandApi, CommandKind, CommandRequest, CommandResults, Session};
use serde_json::{Map, Value};

/// Handle `hivecmd`, `prestocmd` and the other engine subcommands
pub async fn handle_command(
    kind: CommandKind,
    args: CommandArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let api = CommandApi::for_session(session, kind)?;

    match args.action {
        CommandAction::Submit(submit) => {
            let payload = build_payload(kind, &submit)?;
            let command = api.submit(&payload).await?;
            output.info(&format!(
                "Submitted command {} ({})",
                command.id().unwrap_or_default(),
                command.status()
            ))?;
            output.data(&command)
        }
        CommandAction::Run(submit) => {
            let payload = build_payload(kind, &submit)?;
            run(&api, &payload, output).await
        }
        CommandAction::Check(target) => output.data(&api.find(&target.id).await?),
        CommandAction::Cancel(target) => {
            let response = api.cancel(&target.id).await?;
            output.success(&format!("Cancel requested for command {}", target.id))?;
            output.data(&response)
        }
        CommandAction::Getresult(target) => print_results(&api, &target.id, output).await,
        CommandAction::Getlog(target) => output.text(&api.get_log(&target.id).await?),
        CommandAction::List(list) => output.data(&api.list(&utils::list_params(&list)).await?),
    }
}

/// Submit, wait for completion and print results or the failure log
async fn run(api: &CommandApi, payload: &Value, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("run", api.kind().command_type());
    let spinner = output.spinner(&format!("Submitting {}", api.kind().command_type()));

    let outcome = api
        .run_with_progress(payload, |command| {
            if let Some(pb) = &spinner {
                pb.set_message(format!(
                    "Command {} is {}",
                    command.id().unwrap_or_default(),
                    command.status()
                ));
            }
        })
        .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let command = outcome?;
    let id = command
        .id()
        .ok_or_else(|| qds_core::Error::invalid_response("Finished command has no id"))?;
    let status = command.status();

    if status.is_success() {
        output.success(&format!("Command {} finished", id))?;
        return print_results(api, &id, output).await;
    }

    // The log usually explains the failure
    match api.get_log(&id).await {
        Ok(log) => {
            output.error(&format!("Command {} ended as {}, log follows", id, status))?;
            output.diagnostic_text(&log)?
        }
        Err(e) => tracing::warn!(id = %id, error = %e, "Could not fetch log of failed command"),
    }

    Err(Error::JobFailed {
        id,
        status: status.to_string(),
    })
}

async fn print_results(api: &CommandApi, id: &str, output: &mut OutputWriter) -> Result<()> {
    match api.get_results(id).await? {
        CommandResults::Inline(text) => output.text(&text),
        CommandResults::Location(paths) => {
            output.info("Results are stored at:")?;
            output.text(&paths.join("\n"))
        }
    }
}

/// Request body from the file payload overlaid with the flags
pub fn build_payload(kind: CommandKind, args: &SubmitArgs) -> Result<Value> {
    if args.query.is_some() && args.script_location.is_some() {
        return Err(Error::invalid_args(
            "--query and --script-location cannot both be given",
        ));
    }

    let base = utils::load_payload(&args.payload)?;
    if base.is_none() && args.query.is_none() && args.script_location.is_none() {
        return Err(Error::invalid_args(
            "One of --query, --script-location, --data or --file is required",
        ));
    }

    let macros = match &args.macros {
        Some(raw) => Some(
            serde_json::from_str::<Value>(raw)
                .map_err(|e| Error::invalid_args(format!("--macros is not valid JSON: {}", e)))?,
        ),
        None => None,
    };

    let mut extra = Map::new();
    if let Some(db_tap_id) = &args.db_tap_id {
        extra.insert("db_tap_id".to_string(), Value::String(db_tap_id.clone()));
    }

    let request = CommandRequest {
        script: args.query.clone(),
        script_location: args.script_location.clone(),
        label: args.cluster_label.clone(),
        name: args.name.clone(),
        tags: args.tags.clone(),
        macros,
        extra,
    };

    let flags = match request.into_payload(kind) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Ok(Value::Object(utils::merge_over(base.unwrap_or_default(), flags)))
}
