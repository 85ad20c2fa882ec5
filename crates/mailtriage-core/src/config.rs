//! Client configuration.
//!
//! Configuration starts from [`crate::defaults`] and can be overridden from
//! environment variables (`MAILTRIAGE_*` prefixed) or with the `with_*`
//! builder methods.
//!
//! # Example
//!
//! ```rust
//! use mailtriage_core::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_api_base("http://localhost:8080/api")
//!     .with_max_file_bytes(1024 * 1024);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.classify_url(), "http://localhost:8080/api/classify");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::defaults;
use crate::error::{Error, Result};
use crate::validation::FileRules;

/// Settings for talking to the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API; endpoint paths are appended to it.
    pub api_base: String,
    /// Maximum upload size in bytes.
    pub max_file_bytes: u64,
    /// Allowed upload extensions (lowercase, no dot).
    pub allowed_extensions: Vec<String>,
    /// Timeout for a classification request in seconds.
    pub request_timeout_secs: u64,
    /// Interval between health probes in seconds.
    pub health_interval_secs: u64,
    /// Timeout for a single health probe in seconds.
    pub health_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::API_BASE.to_string(),
            max_file_bytes: defaults::MAX_FILE_BYTES,
            allowed_extensions: defaults::ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            health_interval_secs: defaults::HEALTH_INTERVAL_SECS,
            health_timeout_secs: defaults::HEALTH_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MAILTRIAGE_API_BASE` | `http://127.0.0.1:5000/api` | API base URL |
    /// | `MAILTRIAGE_MAX_FILE_BYTES` | `16777216` | Upload size cap |
    /// | `MAILTRIAGE_ALLOWED_EXTENSIONS` | `txt,pdf` | Comma-separated extensions |
    /// | `MAILTRIAGE_REQUEST_TIMEOUT_SECS` | `120` | Classification timeout |
    /// | `MAILTRIAGE_HEALTH_INTERVAL_SECS` | `60` | Health probe interval |
    /// | `MAILTRIAGE_HEALTH_TIMEOUT_SECS` | `5` | Health probe timeout |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_base) = lookup(defaults::ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            config.api_base = api_base.trim().to_string();
        }

        if let Some(exts) = lookup(defaults::ENV_ALLOWED_EXTENSIONS) {
            config.allowed_extensions = exts
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }

        if let Some(v) = parse_var(&lookup, defaults::ENV_MAX_FILE_BYTES) {
            config.max_file_bytes = v;
        }
        if let Some(v) = parse_var(&lookup, defaults::ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, defaults::ENV_HEALTH_INTERVAL_SECS) {
            config.health_interval_secs = v;
        }
        if let Some(v) = parse_var(&lookup, defaults::ENV_HEALTH_TIMEOUT_SECS) {
            config.health_timeout_secs = v;
        }

        debug!(api_base = %config.api_base, "Loaded client configuration");
        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_base.is_empty() {
            return Err(Error::Config("api_base cannot be empty".to_string()));
        }

        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(Error::Config(format!(
                "api_base must start with http:// or https://, got: {}",
                self.api_base
            )));
        }

        if self.allowed_extensions.is_empty() {
            return Err(Error::Config(
                "allowed_extensions cannot be empty".to_string(),
            ));
        }

        if self.max_file_bytes == 0 {
            return Err(Error::Config(
                "max_file_bytes must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 || self.health_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }

        if self.health_interval_secs == 0 {
            return Err(Error::Config(
                "health_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the upload size cap.
    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    /// Replace the allowed extensions.
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the classification request timeout.
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the health probe interval.
    pub fn with_health_interval_secs(mut self, secs: u64) -> Self {
        self.health_interval_secs = secs;
        self
    }

    /// Validation rules for uploads derived from this config.
    pub fn file_rules(&self) -> FileRules {
        FileRules::new(self.max_file_bytes, &self.allowed_extensions)
    }

    pub fn classify_url(&self) -> String {
        format!("{}{}", self.base(), defaults::CLASSIFY_PATH)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base(), defaults::HEALTH_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = key, value = %raw, "Ignoring unparseable numeric setting");
            None
        }
    }
}
