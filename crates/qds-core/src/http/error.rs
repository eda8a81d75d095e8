//! HTTP failure classification
//!
//! Maps status codes and transport failures onto the error taxonomy used by
//! the retry policy. The status table is fixed: callers and scripts match on
//! these classes, so new codes must not silently move between them.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::http::retry::RetryOn;

/// Header carrying the service-side trace id of a failed request
pub const TRACE_ID_HEADER: &str = "X-Qubole-Trace-Id";

/// Classification of HTTP failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 409 - the resource already exists or is in a conflicting state
    Conflict,
    /// 422 - the service rejected the resource as invalid
    Invalid,
    /// Any other 4xx
    ClientError,
    /// Any 5xx not matched by a retry class
    ServerError,
    /// 502, 504 and 449 - transient, retried for idempotent calls
    RetryableDelay,
    /// 429 and 503 - the service asks the caller to wait and retry
    AlwaysRetryableDelay,
    /// Status codes outside every known range
    UnknownConnectionError,
    /// The request hit the socket timeout
    Timeout,
    /// The request never produced a response (connect, TLS, protocol)
    Connection,
}

impl ErrorClassification {
    /// Classify a status code; `None` means success (2xx and 3xx)
    pub fn from_status(code: u16) -> Option<Self> {
        let classification = match code {
            200..=399 => return None,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            409 => Self::Conflict,
            422 => Self::Invalid,
            502 | 504 | 449 => Self::RetryableDelay,
            429 | 503 => Self::AlwaysRetryableDelay,
            401..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::UnknownConnectionError,
        };
        Some(classification)
    }

    /// Fixed message the service contract attaches to some status codes
    pub fn status_message(code: u16) -> Option<&'static str> {
        match code {
            449 => Some("Data requested is unavailable. Retrying..."),
            429 => Some("Too many requests..."),
            503 => Some("Service Unavailable..."),
            _ => None,
        }
    }

    /// Whether a call made under `retry_on` should be retried after this failure
    pub fn is_retryable(&self, retry_on: RetryOn) -> bool {
        match retry_on {
            RetryOn::Idempotent => matches!(
                self,
                Self::RetryableDelay | Self::AlwaysRetryableDelay | Self::Timeout | Self::ServerError
            ),
            RetryOn::ThrottledOnly => matches!(self, Self::AlwaysRetryableDelay),
        }
    }

    /// True for the 4xx family
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest
                | Self::Unauthorized
                | Self::Forbidden
                | Self::NotFound
                | Self::MethodNotAllowed
                | Self::Conflict
                | Self::Invalid
                | Self::ClientError
        )
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "UnauthorizedAccess",
            Self::Forbidden => "ForbiddenAccess",
            Self::NotFound => "ResourceNotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::Conflict => "ResourceConflict",
            Self::Invalid => "ResourceInvalid",
            Self::ClientError => "ClientError",
            Self::ServerError => "ServerError",
            Self::RetryableDelay => "RetryWithDelay",
            Self::AlwaysRetryableDelay => "AlwaysRetryWithDelay",
            Self::UnknownConnectionError => "ConnectionError",
            Self::Timeout => "Timeout",
            Self::Connection => "ConnectionError",
        };
        f.write_str(name)
    }
}

/// A classified HTTP failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    /// HTTP status code if the service answered
    pub status_code: Option<u16>,
    /// Error classification for retry logic
    pub classification: ErrorClassification,
    /// Human-readable error message
    pub message: String,
    /// Raw response body, echoed to the user on failure
    pub body: Option<String>,
    /// Service trace id to quote to support
    pub trace_id: Option<String>,
    /// Request URL
    pub url: Option<String>,
}

impl HttpError {
    /// Create from a failed response, consuming its body
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let url = response.url().to_string();
        let trace_id = response
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await.unwrap_or_default();

        let mut error = Self::from_status(status.as_u16(), body, trace_id);
        error.url = Some(url);
        error
    }

    /// Build an error for a status code and body
    pub fn from_status(code: u16, body: String, trace_id: Option<String>) -> Self {
        let classification = ErrorClassification::from_status(code)
            .unwrap_or(ErrorClassification::UnknownConnectionError);

        let message = match ErrorClassification::status_message(code) {
            Some(fixed) => fixed.to_string(),
            None => Self::extract_message(&body).unwrap_or_else(|| {
                StatusCode::from_u16(code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown status")
                    .to_string()
            }),
        };

        Self {
            status_code: Some(code),
            classification,
            message,
            body: if body.is_empty() { None } else { Some(body) },
            trace_id,
            url: None,
        }
    }

    /// Create from a request that never produced a response
    pub fn from_request_error(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string());

        let (classification, message) = if error.is_timeout() {
            (ErrorClassification::Timeout, format!("Request timed out: {}", error))
        } else if is_tls_failure(&error) {
            (
                ErrorClassification::Connection,
                format!("TLS handshake failed: {}", error_chain(&error)),
            )
        } else {
            (ErrorClassification::Connection, error_chain(&error))
        };

        Self {
            status_code: None,
            classification,
            message,
            body: None,
            trace_id: None,
            url,
        }
    }

    /// A success status whose body is not valid JSON
    pub fn undecodable_body(code: u16, url: String, body: String, error: &serde_json::Error) -> Self {
        Self {
            status_code: Some(code),
            classification: ErrorClassification::ServerError,
            message: format!("Response body is not valid JSON: {}", error),
            body: Some(body),
            trace_id: None,
            url: Some(url),
        }
    }

    /// Pull the service's error text out of a JSON error body
    fn extract_message(body: &str) -> Option<String> {
        let json = serde_json::from_str::<Value>(body).ok()?;

        if let Some(error) = json.get("error") {
            if let Some(message) = error.get("error_message").and_then(|m| m.as_str()) {
                return Some(message.to_string());
            }
            if let Some(message) = error.as_str() {
                return Some(message.to_string());
            }
        }

        json.get("message")
            .and_then(|m| m.as_str())
            .map(|s| s.to_string())
    }

    /// Check if this error should trigger a retry under `retry_on`
    pub fn should_retry(&self, retry_on: RetryOn) -> bool {
        self.classification.is_retryable(retry_on)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (status code {})", self.classification, code)?,
            None => write!(f, "{}", self.classification)?,
        }
        if let Some(url) = &self.url {
            write!(f, " from url {}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for HttpError {}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_tls_failure(error: &reqwest::Error) -> bool {
    let chain = error_chain(error).to_lowercase();
    error.is_connect()
        && (chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_table() {
        let table = [
            (400, ErrorClassification::BadRequest),
            (401, ErrorClassification::Unauthorized),
            (403, ErrorClassification::Forbidden),
            (404, ErrorClassification::NotFound),
            (405, ErrorClassification::MethodNotAllowed),
            (409, ErrorClassification::Conflict),
            (422, ErrorClassification::Invalid),
            (429, ErrorClassification::AlwaysRetryableDelay),
            (449, ErrorClassification::RetryableDelay),
            (502, ErrorClassification::RetryableDelay),
            (503, ErrorClassification::AlwaysRetryableDelay),
            (504, ErrorClassification::RetryableDelay),
        ];

        for (code, expected) in table {
            assert_eq!(ErrorClassification::from_status(code), Some(expected), "status {}", code);
        }
    }

    #[test]
    fn test_catch_all_ranges() {
        assert_eq!(ErrorClassification::from_status(402), Some(ErrorClassification::ClientError));
        assert_eq!(ErrorClassification::from_status(418), Some(ErrorClassification::ClientError));
        assert_eq!(ErrorClassification::from_status(499), Some(ErrorClassification::ClientError));
        assert_eq!(ErrorClassification::from_status(500), Some(ErrorClassification::ServerError));
        assert_eq!(ErrorClassification::from_status(501), Some(ErrorClassification::ServerError));
        assert_eq!(ErrorClassification::from_status(599), Some(ErrorClassification::ServerError));
        assert_eq!(
            ErrorClassification::from_status(600),
            Some(ErrorClassification::UnknownConnectionError)
        );
        assert_eq!(
            ErrorClassification::from_status(101),
            Some(ErrorClassification::UnknownConnectionError)
        );
        assert_eq!(ErrorClassification::from_status(200), None);
        assert_eq!(ErrorClassification::from_status(302), None);
    }

    #[test]
    fn test_fixed_status_messages() {
        let err = HttpError::from_status(449, String::new(), None);
        assert_eq!(err.message, "Data requested is unavailable. Retrying...");

        let err = HttpError::from_status(429, "{\"message\": \"slow down\"}".to_string(), None);
        assert_eq!(err.message, "Too many requests...");

        let err = HttpError::from_status(503, String::new(), None);
        assert_eq!(err.message, "Service Unavailable...");
    }

    #[test]
    fn test_message_extraction() {
        let body = r#"{"error": {"error_code": 422, "error_message": "Invalid cluster label"}}"#;
        let err = HttpError::from_status(422, body.to_string(), Some("abc-123".to_string()));
        assert_eq!(err.message, "Invalid cluster label");
        assert_eq!(err.body.as_deref(), Some(body));
        assert_eq!(err.trace_id.as_deref(), Some("abc-123"));

        let err = HttpError::from_status(404, "not json".to_string(), None);
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn test_retryability_by_verb_class() {
        use ErrorClassification::*;

        for class in [RetryableDelay, AlwaysRetryableDelay, Timeout, ServerError] {
            assert!(class.is_retryable(RetryOn::Idempotent), "{:?}", class);
        }
        for class in [BadRequest, NotFound, Conflict, Invalid, ClientError, Connection] {
            assert!(!class.is_retryable(RetryOn::Idempotent), "{:?}", class);
        }

        assert!(AlwaysRetryableDelay.is_retryable(RetryOn::ThrottledOnly));
        for class in [RetryableDelay, Timeout, ServerError, ClientError] {
            assert!(!class.is_retryable(RetryOn::ThrottledOnly), "{:?}", class);
        }
    }

    #[test]
    fn test_display_includes_status_and_url() {
        let mut err = HttpError::from_status(404, String::new(), None);
        err.url = Some("https://api.example.com/api/v1.2/commands/7".to_string());
        assert_eq!(
            err.to_string(),
            "ResourceNotFound (status code 404) from url https://api.example.com/api/v1.2/commands/7: Not Found"
        );
    }

    proptest! {
        #[test]
        fn prop_every_status_has_one_class(code in 100u16..1000) {
            let class = ErrorClassification::from_status(code);
            match code {
                200..=399 => prop_assert!(class.is_none()),
                400..=499 => prop_assert!(
                    class.map(|c| c.is_client_error()).unwrap_or(false)
                        || matches!(code, 429 | 449)
                ),
                500..=599 => prop_assert!(matches!(
                    class,
                    Some(ErrorClassification::ServerError)
                        | Some(ErrorClassification::RetryableDelay)
                        | Some(ErrorClassification::AlwaysRetryableDelay)
                )),
                _ => prop_assert_eq!(class, Some(ErrorClassification::UnknownConnectionError)),
            }
        }
    }
}
