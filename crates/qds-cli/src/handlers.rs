//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

pub mod clusters;
pub mod commands;
pub mod completions;
pub mod config;
pub mod groups;
pub mod resources;
pub mod scheduler;
pub mod utils;

use crate::cli::{Commands, CrudArgs};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use qds_core::{CommandKind, ResourceApi, ResourceKind, Session};

/// Run a subcommand that talks to the API
pub async fn dispatch(command: Commands, session: &Session, output: &mut OutputWriter) -> Result<()> {
    match command {
        Commands::Hivecmd(args) => commands::handle_command(CommandKind::Hive, args, session, output).await,
        Commands::Hadoopcmd(args) => {
            commands::handle_command(CommandKind::Hadoop, args, session, output).await
        }
        Commands::Pigcmd(args) => commands::handle_command(CommandKind::Pig, args, session, output).await,
        Commands::Sparkcmd(args) => {
            commands::handle_command(CommandKind::Spark, args, session, output).await
        }
        Commands::Prestocmd(args) => {
            commands::handle_command(CommandKind::Presto, args, session, output).await
        }
        Commands::Shellcmd(args) => {
            commands::handle_command(CommandKind::Shell, args, session, output).await
        }
        Commands::Dbtapquerycmd(args) => {
            commands::handle_command(CommandKind::DbTapQuery, args, session, output).await
        }

        Commands::Cluster(args) => clusters::handle_cluster(args, session, output).await,
        Commands::Scheduler(args) => scheduler::handle_scheduler(args, session, output).await,
        Commands::Group(args) => groups::handle_group(args, session, output).await,

        Commands::User(args) => crud(ResourceKind::User, args, session, output).await,
        Commands::Role(args) => crud(ResourceKind::Role, args, session, output).await,
        Commands::Account(args) => crud(ResourceKind::Account, args, session, output).await,
        Commands::Bucket(args) => crud(ResourceKind::Bucket, args, session, output).await,
        Commands::Dbtap(args) => crud(ResourceKind::DbTap, args, session, output).await,
        Commands::Pipeline(args) => crud(ResourceKind::Pipeline, args, session, output).await,
        Commands::Report(args) => crud(ResourceKind::Report, args, session, output).await,

        Commands::Config(_) | Commands::Completions(_) => Err(Error::other(
            "config and completions run without a session",
        )),
    }
}

async fn crud(
    kind: ResourceKind,
    args: CrudArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let api = ResourceApi::for_session(session, kind)?;
    resources::handle_crud(&api, args.action, output).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::cli::OutputFormat;
    use clap::Parser;
    use qds_core::SessionConfig;
    use serde_json::json;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session_for(server: &MockServer) -> Session {
        Session::configure(
            SessionConfig::builder("test-token")
                .api_url(format!("{}/api", server.uri()))
                .max_retries(0)
                .base_retry_delay(Duration::ZERO)
                .poll_interval(Duration::from_secs(1))
                .build(),
        )
    }

    async fn run_cli(server: &MockServer, args: &[&str]) -> (Result<()>, String, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let mut output = OutputWriter::with_writers(
            OutputFormat::Json,
            false,
            false,
            Box::new(out.clone()),
            Box::new(err.clone()),
        );
        let result = dispatch(cli.command, &session_for(server), &mut output).await;
        (result, out.contents(), err.contents())
    }

    #[tokio::test]
    async fn test_run_prints_inline_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1.2/commands"))
            .and(body_json(json!({"query": "select 1", "command_type": "PrestoCommand"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "status": "done"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1.2/commands/5/results"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"inline": true, "results": "1\n"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (result, stdout, _) =
            run_cli(&server, &["qds", "prestocmd", "run", "--query", "select 1"]).await;

        result.unwrap();
        assert_eq!(stdout, "1\n");
    }

    #[tokio::test]
    async fn test_failed_run_prints_log_and_exits_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1.2/commands"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 6, "status": "error"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1.2/commands/6/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("FAILED: syntax error\n"))
            .expect(1)
            .mount(&server)
            .await;

        let (result, stdout, stderr) =
            run_cli(&server, &["qds", "hivecmd", "run", "--query", "selec 1"]).await;

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(matches!(err, Error::JobFailed { .. }));
        assert_eq!(stdout, "");
        assert!(stderr.contains("ERROR: Command 6 ended as error, log follows\nFAILED: syntax error"));
    }

    #[tokio::test]
    async fn test_not_found_exits_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.2/roles/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no role"})))
            .expect(1)
            .mount(&server)
            .await;

        let (result, _, _) = run_cli(&server, &["qds", "role", "show", "9"]).await;

        assert_eq!(result.unwrap_err().exit_code(), 1);
    }

    #[tokio::test]
    async fn test_cluster_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.2/clusters/etl/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "DOWN"})))
            .expect(1)
            .mount(&server)
            .await;

        let (result, stdout, _) = run_cli(&server, &["qds", "cluster", "status", "etl"]).await;

        result.unwrap();
        assert_eq!(stdout, "{\"state\":\"DOWN\"}\n");
    }

    #[tokio::test]
    async fn test_missing_token_is_config_error() {
        let cli = Cli::try_parse_from(["qds", "user", "list"]).unwrap();
        let session = Session::configure(SessionConfig::default());
        let mut output = OutputWriter::with_writers(
            OutputFormat::Json,
            false,
            true,
            Box::new(io::sink()),
            Box::new(io::sink()),
        );

        let err = dispatch(cli.command, &session, &mut output).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
