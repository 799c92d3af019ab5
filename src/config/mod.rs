//! Configuration (layered: code > env > defaults).

use std::time::Duration;

use crate::auth::IntervalPolicy;
use crate::error::{DeviceFlowError, Result};

pub const DEFAULT_CLIENT_ID: &str = "devicegrant-cli";
pub const DEFAULT_SCOPE: &str = "openid profile email";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const ENV_BASE_URL: &str = "DEVICEGRANT_BASE_URL";
const ENV_CLIENT_ID: &str = "DEVICEGRANT_CLIENT_ID";
const ENV_SCOPE: &str = "DEVICEGRANT_SCOPE";
const ENV_REQUEST_TIMEOUT: &str = "DEVICEGRANT_REQUEST_TIMEOUT_SECS";
const ENV_POLL_TIMEOUT: &str = "DEVICEGRANT_POLL_TIMEOUT_SECS";
const ENV_SLOW_DOWN_STEP: &str = "DEVICEGRANT_SLOW_DOWN_STEP_SECS";
const ENV_MAX_INTERVAL: &str = "DEVICEGRANT_MAX_INTERVAL_SECS";

/// Settings for one authorization server and client registration.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use devicegrant::config::DeviceFlowConfig;
///
/// let config = DeviceFlowConfig::new("https://auth.example/api/auth/")
///     .with_client_id("my-cli")
///     .with_poll_timeout(Duration::from_secs(120));
/// assert_eq!(config.base_url, "https://auth.example/api/auth/");
/// assert_eq!(config.normalized_base_url().unwrap(), "https://auth.example/api/auth");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFlowConfig {
    pub base_url: String,
    pub client_id: String,
    pub scope: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Overall wall-clock budget for the polling loop.
    pub poll_timeout: Duration,
    pub interval_policy: IntervalPolicy,
}

impl Default for DeviceFlowConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl DeviceFlowConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            interval_policy: IntervalPolicy::default(),
        }
    }

    /// Load from environment variables (`DEVICEGRANT_*`), reading `.env` first.
    ///
    /// Unset variables keep their defaults; malformed numbers are an error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Some(url) = env_string(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(client_id) = env_string(ENV_CLIENT_ID) {
            config.client_id = client_id;
        }
        if let Some(scope) = env_string(ENV_SCOPE) {
            config.scope = scope;
        }
        if let Some(secs) = env_secs(ENV_REQUEST_TIMEOUT)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs(ENV_POLL_TIMEOUT)? {
            config.poll_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs(ENV_SLOW_DOWN_STEP)? {
            config.interval_policy.slow_down_step = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs(ENV_MAX_INTERVAL)? {
            config.interval_policy.max_interval = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_interval_policy(mut self, policy: IntervalPolicy) -> Self {
        self.interval_policy = policy;
        self
    }

    pub fn normalized_base_url(&self) -> Result<String> {
        normalize_base_url(&self.base_url)
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.normalized_base_url()?;
        if self.client_id.trim().is_empty() {
            return Err(DeviceFlowError::Configuration(
                "client id must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(DeviceFlowError::Configuration(
                "request timeout must be positive".to_string(),
            ));
        }
        self.interval_policy.validate()
    }
}

/// Trim whitespace and trailing slashes; an empty address is rejected.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(DeviceFlowError::Configuration(
            "base address must not be empty".to_string(),
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DeviceFlowError::Configuration(format!(
            "base address must be an http(s) URL: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_secs(key: &str) -> Result<Option<u64>> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
            DeviceFlowError::Configuration(format!("{key} must be a whole number of seconds, got {raw:?}"))
        }),
    }
}
