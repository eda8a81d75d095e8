//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.
//! Connection flags fall back to the `QDS_*` environment variables.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// QDS CLI - submit commands and manage resources on the QDS data platform
#[derive(Parser, Debug)]
#[command(
    name = "qds",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "QDS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "json-pretty")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings; each one overrides the config file
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConnectionArgs {
    /// API token for the account
    #[arg(long, global = true, env = "QDS_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API endpoint
    #[arg(long, global = true, env = "QDS_API_URL")]
    pub url: Option<String>,

    /// API version
    #[arg(long, global = true, env = "QDS_API_VERSION")]
    pub api_version: Option<String>,

    /// Seconds between job status polls (minimum 1)
    #[arg(long, global = true, env = "QDS_POLL_INTERVAL")]
    pub poll_interval: Option<f64>,

    /// Retries for failed requests (maximum 7)
    #[arg(long, global = true, env = "QDS_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Seconds before the first retry, doubled after each retry (maximum 10)
    #[arg(long, global = true, env = "QDS_BASE_RETRY_DELAY")]
    pub base_retry_delay: Option<f64>,

    /// Skip TLS certificate validation
    #[arg(
        long,
        global = true,
        env = "QDS_SKIP_SSL_CERT_CHECK",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub skip_ssl_cert_check: bool,

    /// Cloud the account runs on (aws, azure, oracle_bmc, gcp)
    #[arg(long, global = true, env = "QDS_CLOUD_NAME")]
    pub cloud_name: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hive queries
    Hivecmd(CommandArgs),
    /// Hadoop jobs
    Hadoopcmd(CommandArgs),
    /// Pig scripts
    Pigcmd(CommandArgs),
    /// Spark programs and SQL
    Sparkcmd(CommandArgs),
    /// Presto queries
    Prestocmd(CommandArgs),
    /// Shell scripts
    Shellcmd(CommandArgs),
    /// Queries against a data store
    Dbtapquerycmd(CommandArgs),

    /// Manage clusters
    Cluster(ClusterArgs),
    /// Manage scheduled jobs
    Scheduler(SchedulerArgs),
    /// Manage groups and their members
    Group(GroupArgs),

    /// Manage users
    User(CrudArgs),
    /// Manage roles
    Role(CrudArgs),
    /// Manage the account
    Account(CrudArgs),
    /// Manage storage buckets
    Bucket(CrudArgs),
    /// Manage data store connections
    Dbtap(CrudArgs),
    /// Manage pipelines
    Pipeline(CrudArgs),
    /// Fetch reports
    Report(CrudArgs),

    /// Manage configuration files
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Request body given inline or from a file
#[derive(Args, Debug, Clone, Default)]
pub struct PayloadArgs {
    /// JSON request body
    #[arg(long, value_name = "JSON", conflicts_with = "file")]
    pub data: Option<String>,

    /// File holding the request body (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Paging for list operations
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Results per page
    #[arg(long)]
    pub per_page: Option<u32>,
}

/// Arguments for the command subcommands
#[derive(Args, Debug)]
pub struct CommandArgs {
    #[command(subcommand)]
    pub action: CommandAction,
}

/// Actions on commands
#[derive(Subcommand, Debug)]
pub enum CommandAction {
    /// Submit a command and print it without waiting
    Submit(SubmitArgs),
    /// Submit a command, wait for it and print its results
    Run(SubmitArgs),
    /// Print the current state of a command
    Check(IdArg),
    /// Kill a running command
    Cancel(IdArg),
    /// Print the results of a finished command
    Getresult(IdArg),
    /// Print the log of a command
    Getlog(IdArg),
    /// List recent commands
    List(ListArgs),
}

/// Arguments describing a command submission
#[derive(Args, Debug, Clone, Default)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,

    /// Inline script (query, sub-command, statements ...)
    #[arg(long, value_name = "SCRIPT")]
    pub query: Option<String>,

    /// Location of a script in cloud storage
    #[arg(long)]
    pub script_location: Option<String>,

    /// Label of the cluster to run on
    #[arg(long)]
    pub cluster_label: Option<String>,

    /// Display name for the command
    #[arg(long)]
    pub name: Option<String>,

    /// Comma-separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Macro definitions as a JSON array
    #[arg(long, value_name = "JSON")]
    pub macros: Option<String>,

    /// Data store to run a dbtap query against
    #[arg(long)]
    pub db_tap_id: Option<String>,
}

/// A single resource id
#[derive(Args, Debug, Clone)]
pub struct IdArg {
    /// Resource id
    pub id: String,
}

/// Arguments for generic resource subcommands
#[derive(Args, Debug)]
pub struct CrudArgs {
    #[command(subcommand)]
    pub action: CrudAction,
}

/// Create, read, update and delete
#[derive(Subcommand, Debug)]
pub enum CrudAction {
    /// List resources
    List(ListArgs),
    /// Show one resource
    #[command(visible_alias = "view")]
    Show(IdArg),
    /// Create a resource
    Create(PayloadArgs),
    /// Update a resource
    Update {
        /// Resource id
        id: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Delete a resource
    Delete(IdArg),
}

/// Arguments for the cluster subcommand
#[derive(Args, Debug)]
pub struct ClusterArgs {
    #[command(subcommand)]
    pub action: ClusterAction,
}

/// Cluster actions
#[derive(Subcommand, Debug)]
pub enum ClusterAction {
    #[command(flatten)]
    Crud(CrudAction),
    /// Start a cluster
    Start(IdArg),
    /// Terminate a cluster
    Terminate(IdArg),
    /// Show the running state of a cluster
    Status(IdArg),
}

/// Arguments for the scheduler subcommand
#[derive(Args, Debug)]
pub struct SchedulerArgs {
    #[command(subcommand)]
    pub action: SchedulerAction,
}

/// Scheduler actions
#[derive(Subcommand, Debug)]
pub enum SchedulerAction {
    #[command(flatten)]
    Crud(CrudAction),
    /// Suspend a schedule
    Suspend(IdArg),
    /// Resume a suspended schedule
    Resume(IdArg),
    /// Kill a schedule
    Kill(IdArg),
    /// List past runs of a schedule
    ListInstances {
        /// Schedule id
        id: String,
        #[command(flatten)]
        list: ListArgs,
    },
}

/// Arguments for the group subcommand
#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub action: GroupAction,
}

/// Group actions
#[derive(Subcommand, Debug)]
pub enum GroupAction {
    #[command(flatten)]
    Crud(CrudAction),
    /// Add users to a group
    AddUsers(MembersArgs),
    /// Remove users from a group
    RemoveUsers(MembersArgs),
}

/// Group membership change
#[derive(Args, Debug, Clone)]
pub struct MembersArgs {
    /// Group id
    pub id: String,

    /// User ids or emails
    #[arg(required = true, num_args = 1..)]
    pub users: Vec<String>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (token redacted)
    Show(ConfigShowArgs),
    /// Write a configuration template
    Init(ConfigInitArgs),
}

/// Arguments for config show
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Arguments for config init
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// YAML
    Yaml,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments, leaving the exit policy to the caller
    pub fn try_parse_args() -> std::result::Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
