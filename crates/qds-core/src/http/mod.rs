//! HTTP transport for the QDS REST API
//!
//! - Request building against a versioned base URL
//! - API token authentication
//! - Status classification into typed failures
//! - Retry with exponential backoff, gated by verb class
//! - Failure diagnostics on stderr

pub mod auth;
pub mod builder;
pub mod client;
pub mod diagnostics;
pub mod error;
pub mod retry;

pub use auth::{ApiTokenAuth, AuthHandler, AUTH_TOKEN_HEADER};
pub use builder::RequestBuilder;
pub use client::{Connection, ConnectionConfig, REQUEST_TIMEOUT};
pub use diagnostics::ErrorDiagnostics;
pub use error::{ErrorClassification, HttpError, TRACE_ID_HEADER};
pub use retry::{RetryOn, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};

pub use reqwest::{Method, StatusCode};
