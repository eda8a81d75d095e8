//! Error types for the QDS core library
//!
//! Transport failures keep their full [`HttpError`] (status, classification,
//! body, trace id) so callers can match on the classification instead of on
//! message text.

use thiserror::Error;

use crate::http::{ErrorClassification, HttpError};

/// Main error type for QDS operations
#[derive(Error, Debug)]
pub enum Error {
    /// The session is missing required settings (usually the API token)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A caller-supplied argument was rejected before any request was sent
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The service answered with a failure status or the request never completed
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A request payload could not be encoded
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A successful response did not have the expected shape
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid-response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Classification of the underlying HTTP failure, if this is one
    pub fn classification(&self) -> Option<ErrorClassification> {
        match self {
            Self::Http(err) => Some(err.classification),
            _ => None,
        }
    }

    /// HTTP status code of the underlying failure, if the service answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(err) => err.status_code,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            message: source.to_string(),
            source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: source.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = Error::configuration("No API token set");
        assert_eq!(err.to_string(), "Configuration error: No API token set");
        assert!(err.classification().is_none());
        assert!(err.status_code().is_none());
    }

    #[test]
    fn test_http_error_exposes_classification() {
        let err: Error = HttpError::from_status(404, "missing".to_string(), None).into();
        assert_eq!(err.classification(), Some(ErrorClassification::NotFound));
        assert_eq!(err.status_code(), Some(404));
    }
}
