//! Error diagnostics for failed API calls
//!
//! Every failed response is echoed to stderr before the typed error is
//! returned, together with the service trace id when one was supplied so the
//! user can quote it to support.

use crate::http::{ErrorClassification, HttpError};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

/// Diagnostic information for an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDiagnostics {
    /// The original error
    pub error: String,

    /// Error classification
    pub classification: ErrorClassification,

    /// Raw response body, if any
    pub body: Option<String>,

    /// Service trace id, if any
    pub trace_id: Option<String>,

    /// When the failure was observed
    pub timestamp: DateTime<Utc>,

    /// Suggested actions for the user
    pub suggested_actions: Vec<String>,
}

impl ErrorDiagnostics {
    /// Create new diagnostics from an HTTP error
    pub fn from_http_error(error: &HttpError) -> Self {
        Self::at(error, Utc::now())
    }

    /// Create diagnostics stamped with an explicit time
    pub fn at(error: &HttpError, timestamp: DateTime<Utc>) -> Self {
        Self {
            error: error.to_string(),
            classification: error.classification,
            body: error.body.clone(),
            trace_id: error.trace_id.clone(),
            timestamp,
            suggested_actions: Self::suggest_actions_for(error.classification),
        }
    }

    /// Line asking the user to share the trace id with support
    pub fn support_line(&self) -> Option<String> {
        self.trace_id.as_ref().map(|id| {
            format!(
                "{} Request failed. Please share the trace id {} with support for assistance.",
                self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                id
            )
        })
    }

    fn suggest_actions_for(classification: ErrorClassification) -> Vec<String> {
        match classification {
            ErrorClassification::Unauthorized => vec![
                "Check that QDS_API_TOKEN holds a valid API token".to_string(),
                "Verify the token belongs to the account behind QDS_API_URL".to_string(),
            ],
            ErrorClassification::Forbidden => {
                vec!["Ask an account administrator for the required role".to_string()]
            }
            ErrorClassification::NotFound => {
                vec!["Verify the resource id and the API version".to_string()]
            }
            ErrorClassification::AlwaysRetryableDelay | ErrorClassification::RetryableDelay => {
                vec!["The service is busy; try again in a few moments".to_string()]
            }
            ErrorClassification::Timeout | ErrorClassification::Connection => vec![
                "Check network connectivity to the API endpoint".to_string(),
                "Verify QDS_API_URL is correct".to_string(),
            ],
            _ => Vec::new(),
        }
    }

    /// Format as a user-friendly error report
    pub fn format_display(&self, use_color: bool) -> String {
        let mut output = String::new();

        if let Some(body) = &self.body {
            output.push_str(body.trim_end());
            output.push('\n');
        }

        if let Some(line) = self.support_line() {
            if use_color {
                output.push_str(&line.yellow().to_string());
            } else {
                output.push_str(&line);
            }
            output.push('\n');
        }

        output
    }
}

impl fmt::Display for ErrorDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_display(false))
    }
}

/// Echo a failed response to stderr
pub fn emit(error: &HttpError) {
    let diagnostics = ErrorDiagnostics::from_http_error(error);
    let report = diagnostics.format_display(colored::control::SHOULD_COLORIZE.should_colorize());
    if report.is_empty() {
        return;
    }

    let stderr = io::stderr();
    let mut handle = stderr.lock();
    // best effort
    let _ = handle.write_all(report.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn failed(code: u16, body: &str, trace_id: Option<&str>) -> HttpError {
        HttpError::from_status(code, body.to_string(), trace_id.map(str::to_string))
    }

    #[test]
    fn test_support_line_with_trace_id() {
        let error = failed(500, "{\"error\": \"boom\"}", Some("trace-42"));
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let diagnostics = ErrorDiagnostics::at(&error, timestamp);

        assert_eq!(
            diagnostics.support_line().unwrap(),
            "2024-03-01 12:30:00 UTC Request failed. Please share the trace id trace-42 with support for assistance."
        );
    }

    #[test]
    fn test_no_support_line_without_trace_id() {
        let error = failed(404, "missing", None);
        let diagnostics = ErrorDiagnostics::from_http_error(&error);

        assert!(diagnostics.support_line().is_none());
        assert_eq!(diagnostics.format_display(false), "missing\n");
    }

    #[test]
    fn test_report_contains_body_and_trace() {
        let error = failed(401, "{\"error\": \"bad token\"}", Some("t-1"));
        let display = ErrorDiagnostics::from_http_error(&error).format_display(false);

        assert!(display.starts_with("{\"error\": \"bad token\"}\n"));
        assert!(display.contains("trace id t-1"));
    }

    #[test]
    fn test_suggestions_by_classification() {
        let diagnostics = ErrorDiagnostics::from_http_error(&failed(401, "", None));
        assert!(!diagnostics.suggested_actions.is_empty());

        let diagnostics = ErrorDiagnostics::from_http_error(&failed(409, "", None));
        assert!(diagnostics.suggested_actions.is_empty());
    }
}
