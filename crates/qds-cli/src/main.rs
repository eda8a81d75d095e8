//! QDS CLI - command-line interface for the QDS data platform
//!
//! Submits Hive, Presto, Spark and other commands, waits for them, and
//! manages clusters, schedules, groups and account resources.
//!
//! Exit status: 0 on success, 1 when the service rejects a request or a
//! command fails, 2 for usage errors, 3 for unexpected errors and 4 for
//! missing or invalid configuration. A panic also exits with 3.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use qds_core::Session;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    install_panic_hook();
    let code = run_to_exit_code().await;
    process::exit(code);
}

/// A panic is an internal error: report it as usual, then exit with status 3
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        tracing::error!(panic = %info, "Unexpected panic");
        process::exit(error::EXIT_INTERNAL);
    }));
}

/// Everything up to the exit status; log buffers are flushed before returning
async fn run_to_exit_code() -> i32 {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version print to stdout and exit 0
            let _ = e.print();
            return e.exit_code();
        }
    };

    let config = Config::load_with_file(cli.config.as_deref());
    let file_color = config.as_ref().map(|c| c.output.color).unwrap_or(true);
    control::set_override(cli.use_color() && file_color);

    let _guard = match &config {
        Ok(config) => init_logging(&cli, config),
        Err(_) => init_logging(&cli, &Config::default()),
    };

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!(
                "{}",
                error::format_error(&e, control::SHOULD_COLORIZE.should_colorize())
            );
            e.exit_code()
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(
        cli.output,
        control::SHOULD_COLORIZE.should_colorize(),
        cli.quiet,
        config.output.progress,
    );

    tracing::debug!(
        verbosity = cli.verbosity_level(),
        format = ?output.format(),
        "Executing command"
    );

    match cli.command {
        Commands::Config(args) => handlers::config::handle_config(args, &config, &mut output),
        Commands::Completions(args) => {
            handlers::completions::handle_completions(args, &mut std::io::stdout())
        }
        command => {
            let session = Session::configure(config.session_config(&cli.connection)?);
            handlers::dispatch(command, &session, &mut output).await
        }
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Option<WorkerGuard> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_file(&config.logging, cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    match logging::init_logging(logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    }
}
