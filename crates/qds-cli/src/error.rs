//! Error types and handling for the CLI
//!
//! Every failure maps to one of a small set of exit codes so scripts can
//! tell API failures from usage and configuration mistakes.

use std::io;
use std::path::PathBuf;

use qds_core::http::ErrorDiagnostics;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// The service rejected a request, or a job finished unsuccessfully
pub const EXIT_API_FAILURE: i32 = 1;
/// Bad arguments or unreadable input files
pub const EXIT_USAGE: i32 = 2;
/// Anything unexpected
pub const EXIT_INTERNAL: i32 = 3;
/// Missing or invalid configuration
pub const EXIT_CONFIG: i32 = 4;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from qds-core
    #[error(transparent)]
    Core(#[from] qds_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// A job reached a terminal state other than done
    #[error("Command {id} finished with status '{status}'")]
    JobFailed { id: String, status: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Startup failures with context attached
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(core) => match core {
                qds_core::Error::Configuration { .. } => EXIT_CONFIG,
                qds_core::Error::InvalidInput { .. } => EXIT_USAGE,
                qds_core::Error::Http(_) | qds_core::Error::InvalidResponse { .. } => {
                    EXIT_API_FAILURE
                }
                _ => EXIT_INTERNAL,
            },
            Self::JobFailed { .. } => EXIT_API_FAILURE,
            Self::Config(_) => EXIT_CONFIG,
            Self::InvalidArgs(_) | Self::FileNotFound { .. } | Self::InvalidFormat { .. } => {
                EXIT_USAGE
            }
            Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_)
            | Self::Internal(_)
            | Self::Other { .. } => EXIT_INTERNAL,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    // Service failures also get the support hints
    if let Error::Core(qds_core::Error::Http(http)) = error {
        let diagnostics = ErrorDiagnostics::from_http_error(http);
        for action in &diagnostics.suggested_actions {
            message.push_str("\n  - ");
            message.push_str(action);
        }
    }

    if error.should_show_help() {
        message.push_str("\n\nRun 'qds --help' for usage.");
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use qds_core::HttpError;

    #[test]
    fn test_exit_codes() {
        let not_found = HttpError::from_status(404, String::new(), None);
        assert_eq!(Error::Core(not_found.into()).exit_code(), 1);
        assert_eq!(
            Error::JobFailed {
                id: "1".into(),
                status: "error".into()
            }
            .exit_code(),
            1
        );
        assert_eq!(Error::invalid_args("bad").exit_code(), 2);
        assert_eq!(
            Error::FileNotFound {
                path: PathBuf::from("missing.json")
            }
            .exit_code(),
            2
        );
        assert_eq!(
            Error::Core(qds_core::Error::invalid_input("payload is a list")).exit_code(),
            2
        );
        assert_eq!(Error::other("boom").exit_code(), 3);
        assert_eq!(Error::config("no token").exit_code(), 4);
        assert_eq!(
            Error::Core(qds_core::Error::configuration("no token")).exit_code(),
            4
        );
    }

    #[test]
    fn test_format_error_plain() {
        let formatted = format_error(&Error::config("No API token set"), false);
        assert_eq!(formatted, "Error: Configuration error: No API token set");
    }

    #[test]
    fn test_format_error_with_help() {
        let formatted = format_error(&Error::invalid_args("--query or --file required"), false);
        assert!(formatted.starts_with("Error: Invalid arguments"));
        assert!(formatted.ends_with("Run 'qds --help' for usage."));
    }

    #[test]
    fn test_job_failed_message() {
        let err = Error::JobFailed {
            id: "42".into(),
            status: "cancelled".into(),
        };
        assert_eq!(err.to_string(), "Command 42 finished with status 'cancelled'");
    }
}
