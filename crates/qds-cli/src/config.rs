//! Configuration management for the CLI
//!
//! Settings are resolved in this order, later sources winning:
//! - Default values
//! - Configuration file (YAML, JSON or TOML)
//! - Environment variables and command-line flags

use crate::cli::ConnectionArgs;
use crate::error::{Error, Result};
use qds_core::{CloudName, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API token for the account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// API endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// API version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Seconds between job status polls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<f64>,

    /// Retries for failed requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Seconds before the first retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_retry_delay: Option<f64>,

    /// Skip TLS certificate validation
    pub skip_ssl_cert_check: bool,

    /// Cloud the account runs on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_name: Option<String>,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators while waiting on jobs
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            file: None,
        }
    }
}

/// Serialization format of a config file, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
    Toml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "yaml, json or toml".to_string(),
            }),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::from_path(path)? {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid TOML in {}: {}", path.display(), e)))?,
        };

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".qds.yaml"), PathBuf::from(".qds.json")];

        if let Some(dir) = Self::user_config_dir() {
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
            paths.push(dir.join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".qds.yaml"));
        }

        paths
    }

    /// Per-user configuration directory
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qds"))
    }

    /// Resolve the session settings, letting flags and environment win over the file
    pub fn session_config(&self, args: &ConnectionArgs) -> Result<SessionConfig> {
        let mut builder = SessionConfig::default().to_builder();

        if let Some(token) = args.token.as_ref().or(self.api_token.as_ref()) {
            builder = builder.api_token(token.clone());
        }
        if let Some(url) = args.url.as_ref().or(self.api_url.as_ref()) {
            builder = builder.api_url(url.clone());
        }
        if let Some(version) = args.api_version.as_ref().or(self.api_version.as_ref()) {
            builder = builder.api_version(version.clone());
        }
        if let Some(secs) = args.poll_interval.or(self.poll_interval) {
            builder = builder.poll_interval(seconds("poll interval", secs)?);
        }
        if let Some(retries) = args.max_retries.or(self.max_retries) {
            builder = builder.max_retries(retries);
        }
        if let Some(secs) = args.base_retry_delay.or(self.base_retry_delay) {
            builder = builder.base_retry_delay(seconds("base retry delay", secs)?);
        }
        builder = builder.skip_ssl_cert_check(args.skip_ssl_cert_check || self.skip_ssl_cert_check);
        if let Some(cloud) = args.cloud_name.as_ref().or(self.cloud_name.as_ref()) {
            let cloud: CloudName = cloud.parse()?;
            builder = builder.cloud_name(cloud);
        }

        Ok(builder.build())
    }

    /// Copy with the token masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_token.is_some() {
            copy.api_token = Some("***".to_string());
        }
        copy
    }

    /// Starter file for `qds config init`
    pub fn template() -> Self {
        Self {
            api_token: Some("<your-api-token>".to_string()),
            api_url: Some(qds_core::session::DEFAULT_API_URL.to_string()),
            api_version: Some(qds_core::session::DEFAULT_API_VERSION.to_string()),
            poll_interval: Some(qds_core::session::DEFAULT_POLL_INTERVAL.as_secs_f64()),
            max_retries: Some(qds_core::session::MAX_RETRIES),
            base_retry_delay: Some(qds_core::session::MAX_RETRY_DELAY.as_secs_f64()),
            cloud_name: Some(CloudName::default().to_string()),
            ..Self::default()
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match FileFormat::from_path(path)? {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Cannot encode TOML: {}", e)))?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn seconds(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| Error::config(format!("{} must be a non-negative number of seconds, got {}", name, secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_token.is_none());
        assert!(config.output.progress);
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "api_token: abc\napi_url: https://eu.example.com/api\npoll_interval: 2.5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.poll_interval, Some(2.5));
    }

    #[test]
    fn test_load_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_token = \"abc\"\nmax_retries = 2\n[output]\nprogress = false\n")
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.max_retries, Some(2));
        assert!(!config.output.progress);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/qds.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "api_token=abc").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_flags_override_file() {
        let config = Config {
            api_token: Some("from-file".into()),
            api_url: Some("https://file.example.com/api".into()),
            max_retries: Some(2),
            ..Config::default()
        };
        let args = ConnectionArgs {
            token: Some("from-flag".into()),
            poll_interval: Some(3.0),
            ..ConnectionArgs::default()
        };

        let session = config.session_config(&args).unwrap();
        assert_eq!(session.api_token(), Some("from-flag"));
        assert_eq!(session.api_url(), "https://file.example.com/api");
        assert_eq!(session.max_retries(), 2);
        assert_eq!(session.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_session_config_clamps() {
        let args = ConnectionArgs {
            poll_interval: Some(0.2),
            max_retries: Some(20),
            base_retry_delay: Some(60.0),
            ..ConnectionArgs::default()
        };

        let session = Config::default().session_config(&args).unwrap();
        assert_eq!(session.poll_interval(), Duration::from_secs(1));
        assert_eq!(session.max_retries(), 7);
        assert_eq!(session.base_retry_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_negative_seconds_rejected() {
        let args = ConnectionArgs {
            base_retry_delay: Some(-1.0),
            ..ConnectionArgs::default()
        };
        let err = Config::default().session_config(&args).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let template = Config::template();
        template.save(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), template);
    }

    #[test]
    fn test_redacted_hides_token() {
        let config = Config {
            api_token: Some("secret".into()),
            ..Config::default()
        };
        assert_eq!(config.redacted().api_token.as_deref(), Some("***"));
        assert!(Config::default().redacted().api_token.is_none());
    }
}
