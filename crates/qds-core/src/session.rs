//! Session configuration and connection handles
//!
//! A [`SessionConfig`] is built once, from a builder or from the environment,
//! and frozen. A [`Session`] shares it behind an `Arc` and hands out
//! [`Connection`]s: one cached handle for the configured API version, and a
//! fresh handle for every explicit version override.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::{ApiTokenAuth, Connection, ConnectionConfig, RetryPolicy, REQUEST_TIMEOUT};
use crate::poll::Poller;
use crate::{Error, Result};

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://api.qubole.com/api";

/// Default API version
pub const DEFAULT_API_VERSION: &str = "v1.2";

/// Default interval between job status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest accepted poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Largest accepted retry budget
pub const MAX_RETRIES: u32 = 7;

/// Largest accepted base retry delay
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Cloud the account runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudName {
    #[default]
    Aws,
    Azure,
    Oracle,
    Gcp,
}

impl CloudName {
    /// Name the service uses for this cloud
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Azure => "AZURE",
            Self::Oracle => "ORACLE_BMC",
            Self::Gcp => "GCP",
        }
    }
}

impl fmt::Display for CloudName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "oracle" | "oracle_bmc" => Ok(Self::Oracle),
            "gcp" => Ok(Self::Gcp),
            other => Err(Error::configuration(format!(
                "Unknown cloud name '{}'. Expected one of: aws, azure, oracle_bmc, gcp",
                other
            ))),
        }
    }
}

/// Immutable session settings
#[derive(Clone, PartialEq)]
pub struct SessionConfig {
    api_token: Option<String>,
    api_url: String,
    api_version: String,
    poll_interval: Duration,
    max_retries: u32,
    base_retry_delay: Duration,
    skip_ssl_cert_check: bool,
    cloud_name: CloudName,
}

impl SessionConfig {
    /// Start building a config around an API token
    pub fn builder(api_token: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::default().api_token(api_token)
    }

    /// Read the `QDS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup, using the `QDS_*` names
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = SessionConfigBuilder::default();

        if let Some(token) = lookup("QDS_API_TOKEN") {
            builder = builder.api_token(token);
        }
        if let Some(url) = lookup("QDS_API_URL") {
            builder = builder.api_url(url);
        }
        if let Some(version) = lookup("QDS_API_VERSION") {
            builder = builder.api_version(version);
        }
        if let Some(raw) = lookup("QDS_POLL_INTERVAL") {
            builder = builder.poll_interval(parse_seconds("QDS_POLL_INTERVAL", &raw)?);
        }
        if let Some(raw) = lookup("QDS_MAX_RETRIES") {
            let retries = raw.trim().parse::<u32>().map_err(|e| Error::Configuration {
                message: format!("QDS_MAX_RETRIES must be a non-negative integer, got '{}'", raw),
                source: Some(e.into()),
            })?;
            builder = builder.max_retries(retries);
        }
        if let Some(raw) = lookup("QDS_BASE_RETRY_DELAY") {
            builder = builder.base_retry_delay(parse_seconds("QDS_BASE_RETRY_DELAY", &raw)?);
        }
        if let Some(raw) = lookup("QDS_SKIP_SSL_CERT_CHECK") {
            builder = builder.skip_ssl_cert_check(parse_flag(&raw));
        }
        if let Some(raw) = lookup("QDS_CLOUD_NAME") {
            builder = builder.cloud_name(raw.parse()?);
        }

        Ok(builder.build())
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_retry_delay(&self) -> Duration {
        self.base_retry_delay
    }

    pub fn skip_ssl_cert_check(&self) -> bool {
        self.skip_ssl_cert_check
    }

    pub fn cloud_name(&self) -> CloudName {
        self.cloud_name
    }

    /// Retry policy derived from the retry budget and base delay
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.base_retry_delay)
    }

    /// Builder pre-filled with this config, for deriving a modified copy
    pub fn to_builder(&self) -> SessionConfigBuilder {
        SessionConfigBuilder {
            api_token: self.api_token.clone(),
            api_url: Some(self.api_url.clone()),
            api_version: Some(self.api_version.clone()),
            poll_interval: Some(self.poll_interval),
            max_retries: Some(self.max_retries),
            base_retry_delay: Some(self.base_retry_delay),
            skip_ssl_cert_check: self.skip_ssl_cert_check,
            cloud_name: self.cloud_name,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfigBuilder::default().build()
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("poll_interval", &self.poll_interval)
            .field("max_retries", &self.max_retries)
            .field("base_retry_delay", &self.base_retry_delay)
            .field("skip_ssl_cert_check", &self.skip_ssl_cert_check)
            .field("cloud_name", &self.cloud_name)
            .finish()
    }
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    api_token: Option<String>,
    api_url: Option<String>,
    api_version: Option<String>,
    poll_interval: Option<Duration>,
    max_retries: Option<u32>,
    base_retry_delay: Option<Duration>,
    skip_ssl_cert_check: bool,
    cloud_name: CloudName,
}

impl SessionConfigBuilder {
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = Some(delay);
        self
    }

    pub fn skip_ssl_cert_check(mut self, skip: bool) -> Self {
        self.skip_ssl_cert_check = skip;
        self
    }

    pub fn cloud_name(mut self, cloud: CloudName) -> Self {
        self.cloud_name = cloud;
        self
    }

    /// Freeze the settings, clamping out-of-range values
    pub fn build(self) -> SessionConfig {
        let mut poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested_secs = poll_interval.as_secs_f64(),
                "Poll interval cannot be less than {} seconds. Setting it to {} seconds.",
                MIN_POLL_INTERVAL.as_secs(),
                MIN_POLL_INTERVAL.as_secs()
            );
            poll_interval = MIN_POLL_INTERVAL;
        }

        let max_retries = self.max_retries.unwrap_or(MAX_RETRIES).min(MAX_RETRIES);
        let base_retry_delay = self
            .base_retry_delay
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY);

        SessionConfig {
            api_token: self.api_token,
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            poll_interval,
            max_retries,
            base_retry_delay,
            skip_ssl_cert_check: self.skip_ssl_cert_check,
            cloud_name: self.cloud_name,
        }
    }
}

fn parse_seconds(name: &str, raw: &str) -> Result<Duration> {
    let secs = raw.trim().parse::<f64>().map_err(|e| Error::Configuration {
        message: format!("{} must be a number of seconds, got '{}'", name, raw),
        source: Some(e.into()),
    })?;
    Duration::try_from_secs_f64(secs).map_err(|e| Error::Configuration {
        message: format!("{} must be a non-negative number of seconds, got '{}'", name, raw),
        source: Some(e.into()),
    })
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configured session handing out connection handles
#[derive(Debug)]
pub struct Session {
    config: Arc<SessionConfig>,
    default_agent: OnceLock<Arc<Connection>>,
}

impl Session {
    /// Freeze `config` into a new session
    pub fn configure(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
            default_agent: OnceLock::new(),
        }
    }

    /// Session configured from the `QDS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::configure(SessionConfig::from_env()?))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared handle to the frozen config
    pub fn shared_config(&self) -> Arc<SessionConfig> {
        Arc::clone(&self.config)
    }

    /// Connection for the configured version, or a fresh one for `version`
    ///
    /// The default connection is created on first use and shared afterwards.
    /// A version override is never cached.
    pub fn agent(&self, version: Option<&str>) -> Result<Arc<Connection>> {
        if let Some(version) = version {
            return Ok(Arc::new(self.connect(version)?));
        }

        if let Some(agent) = self.default_agent.get() {
            return Ok(Arc::clone(agent));
        }

        let agent = Arc::new(self.connect(self.config.api_version())?);
        Ok(Arc::clone(self.default_agent.get_or_init(|| agent)))
    }

    /// Poller using the configured poll interval
    pub fn poller(&self) -> Poller {
        Poller::new(self.config.poll_interval())
    }

    fn connect(&self, version: &str) -> Result<Connection> {
        let token = self.config.api_token().filter(|t| !t.trim().is_empty());
        if token.is_none() {
            return Err(Error::configuration(
                "No API token specified. Set QDS_API_TOKEN or pass --token",
            ));
        }

        tracing::debug!(
            url = self.config.api_url(),
            version,
            "Creating API connection"
        );

        let connection_config = ConnectionConfig {
            retry_policy: self.config.retry_policy(),
            timeout: REQUEST_TIMEOUT,
            skip_ssl_cert_check: self.config.skip_ssl_cert_check(),
            ..Default::default()
        };

        Connection::new(
            self.config.api_url(),
            version,
            Arc::new(ApiTokenAuth::from_option(token)),
            connection_config,
        )
    }
}
