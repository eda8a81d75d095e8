//! HTTP request builder for QDS API requests
//!
//! Joins the base URL, API version and resource path, and attaches the fixed
//! header set every call carries.

use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::Result;

/// Builder for constructing versioned API requests
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    version: String,
    headers: HashMap<String, String>,
}

impl RequestBuilder {
    /// Create a builder for `base_url` and API `version`
    pub fn new(base_url: &str, version: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| crate::Error::Configuration {
            message: format!("Invalid API URL: {}", base_url),
            source: Some(e.into()),
        })?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert(
            "User-Agent".to_string(),
            format!("qds-sdk-rust/{}", crate::VERSION),
        );

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.trim_matches('/').to_string(),
            headers,
        })
    }

    /// API version this builder targets
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Base URL without the version segment
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for `path`
    ///
    /// `payload` becomes the JSON body; `params` the query string.
    pub fn build_request(
        &self,
        client: &reqwest::Client,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(String, String)],
        extra_headers: &HashMap<String, String>,
    ) -> Result<reqwest::Request> {
        let url = self.build_url(path)?;

        let mut request_builder = client.request(method, url);

        for (key, value) in self.headers.iter().chain(extra_headers.iter()) {
            request_builder = request_builder.header(key, value);
        }

        if !params.is_empty() {
            request_builder = request_builder.query(params);
        }

        if let Some(body) = payload {
            request_builder = request_builder.json(body);
        }

        request_builder
            .build()
            .map_err(|e| crate::Error::Internal {
                message: format!("Failed to build request for {}", path),
                source: e.into(),
            })
    }

    /// Build the full URL: base URL, version, then path
    pub fn build_url(&self, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url,
            self.version,
            path.trim_start_matches('/')
        );

        Url::parse(&raw).map_err(|e| crate::Error::Configuration {
            message: format!("Invalid request URL: {}", raw),
            source: Some(e.into()),
        })
    }
}
