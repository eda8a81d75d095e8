//! Authenticated, retrying connection to the QDS API
//!
//! A [`Connection`] is bound to one base URL and API version. Every verb goes
//! through the same path: build the request once, then let the
//! [`RetryPolicy`] drive attempts under the retry class of the verb.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method};
use serde_json::Value;

use crate::http::{
    diagnostics,
    AuthHandler,
    ErrorClassification,
    HttpError,
    RequestBuilder,
    RetryOn,
    RetryPolicy,
};
use crate::redaction;
use crate::Result;

/// Socket timeout applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for a connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Retry policy for failed requests
    pub retry_policy: RetryPolicy,
    /// Per-request timeout
    pub timeout: Duration,
    /// Skip TLS certificate validation
    pub skip_ssl_cert_check: bool,
    /// Echo failed response bodies and trace ids to stderr
    pub echo_errors: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            timeout: REQUEST_TIMEOUT,
            skip_ssl_cert_check: false,
            echo_errors: true,
        }
    }
}

/// Body and metadata of a response that passed classification
struct RawResponse {
    status: u16,
    url: String,
    body: String,
}

/// Connection handle for one API version
pub struct Connection {
    /// Underlying reqwest client
    client: ReqwestClient,
    /// Request builder for constructing requests
    request_builder: RequestBuilder,
    /// Headers produced by the auth handler
    auth_headers: HashMap<String, String>,
    /// Connection configuration
    config: ConnectionConfig,
}

impl Connection {
    /// Create a connection; fails with a configuration error if the
    /// credentials are missing, before any network I/O
    pub fn new(
        base_url: &str,
        version: &str,
        auth_handler: Arc<dyn AuthHandler>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        auth_handler.validate_credentials()?;
        let mut auth_headers = HashMap::new();
        auth_handler.apply_auth(&mut auth_headers)?;

        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_ssl_cert_check)
            .build()
            .map_err(|e| crate::Error::Internal {
                message: "Failed to create HTTP client".to_string(),
                source: e.into(),
            })?;

        let request_builder = RequestBuilder::new(base_url, version)?;

        Ok(Self {
            client,
            request_builder,
            auth_headers,
            config,
        })
    }

    /// API version this connection targets
    pub fn version(&self) -> &str {
        self.request_builder.version()
    }

    /// Base URL without the version segment
    pub fn base_url(&self) -> &str {
        self.request_builder.base_url()
    }

    /// Connection configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// GET `path` and decode the JSON response
    pub async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        self.dispatch(Method::GET, path, None, params, decode_json).await
    }

    /// GET `path` and return the body undecoded
    pub async fn get_raw(&self, path: &str, params: &[(String, String)]) -> Result<String> {
        self.dispatch(Method::GET, path, None, params, decode_text).await
    }

    /// POST `payload` to `path`
    pub async fn post(&self, path: &str, payload: Option<&Value>) -> Result<Value> {
        self.dispatch(Method::POST, path, payload, &[], decode_json).await
    }

    /// PUT `payload` to `path`
    pub async fn put(&self, path: &str, payload: Option<&Value>) -> Result<Value> {
        self.dispatch(Method::PUT, path, payload, &[], decode_json).await
    }

    /// DELETE `path`
    pub async fn delete(&self, path: &str, payload: Option<&Value>) -> Result<Value> {
        self.dispatch(Method::DELETE, path, payload, &[], decode_json).await
    }

    async fn dispatch<T>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(String, String)],
        decode: fn(RawResponse) -> std::result::Result<T, HttpError>,
    ) -> Result<T> {
        let request = self.request_builder.build_request(
            &self.client,
            method.clone(),
            path,
            payload,
            params,
            &self.auth_headers,
        )?;

        let redacted_payload = payload.map(|p| {
            let mut copy = p.clone();
            redaction::redact_json_value(&mut copy);
            copy
        });
        let retry_on = RetryOn::for_method(&method);
        let request = &request;
        let redacted_payload = redacted_payload.as_ref();

        let result = self
            .config
            .retry_policy
            .execute(
                move || async move {
                    tracing::debug!(
                        method = %request.method(),
                        url = %request.url(),
                        payload = ?redacted_payload,
                        params = ?params,
                        "Sending API request"
                    );
                    let raw = self.attempt(request).await?;
                    decode(raw)
                },
                retry_on,
            )
            .await;

        result.map_err(crate::Error::from)
    }

    async fn attempt(&self, request: &reqwest::Request) -> std::result::Result<RawResponse, HttpError> {
        let request = request.try_clone().ok_or_else(|| HttpError {
            status_code: None,
            classification: ErrorClassification::Connection,
            message: "Request body cannot be cloned for retry".to_string(),
            body: None,
            trace_id: None,
            url: Some(request.url().to_string()),
        })?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(HttpError::from_request_error)?;

        let status = response.status().as_u16();
        if ErrorClassification::from_status(status).is_some() {
            let error = HttpError::from_response(response).await;
            if self.config.echo_errors {
                diagnostics::emit(&error);
            }
            return Err(error);
        }

        let url = response.url().to_string();
        let body = response.text().await.map_err(HttpError::from_request_error)?;
        tracing::trace!(status, url = %url, bytes = body.len(), "Received API response");

        Ok(RawResponse { status, url, body })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url())
            .field("version", &self.version())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn decode_json(raw: RawResponse) -> std::result::Result<Value, HttpError> {
    if raw.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&raw.body)
        .map_err(|e| HttpError::undecodable_body(raw.status, raw.url, raw.body.clone(), &e))
}

fn decode_text(raw: RawResponse) -> std::result::Result<String, HttpError> {
    Ok(raw.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiTokenAuth;

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(!config.skip_ssl_cert_check);
        assert!(config.echo_errors);
        assert_eq!(config.retry_policy.max_retries, 7);
    }

    #[test]
    fn test_missing_token_fails_before_network() {
        let auth = Arc::new(ApiTokenAuth::from_option(None));
        let result = Connection::new(
            "https://api.example.com/api",
            "v1.2",
            auth,
            ConnectionConfig::default(),
        );
        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
    }

    #[test]
    fn test_connection_reports_version() {
        let auth = Arc::new(ApiTokenAuth::new("token"));
        let connection = Connection::new(
            "https://api.example.com/api/",
            "v2",
            auth,
            ConnectionConfig::default(),
        )
        .unwrap();

        assert_eq!(connection.version(), "v2");
        assert_eq!(connection.base_url(), "https://api.example.com/api");
        assert!(!format!("{:?}", connection).contains("token\""));
    }

    #[test]
    fn test_decode_json_empty_body_is_null() {
        let raw = RawResponse {
            status: 204,
            url: "https://api.example.com".to_string(),
            body: String::new(),
        };
        assert_eq!(decode_json(raw).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_json_invalid_body_is_server_error() {
        let raw = RawResponse {
            status: 200,
            url: "https://api.example.com".to_string(),
            body: "<html>".to_string(),
        };
        let error = decode_json(raw).unwrap_err();
        assert_eq!(error.classification, ErrorClassification::ServerError);
        assert_eq!(error.status_code, Some(200));
    }
}
