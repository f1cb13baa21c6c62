use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::CoreError;

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "BALANCE_API_URL";

/// Environment variable overriding the general request timeout (seconds).
pub const ENV_REQUEST_TIMEOUT: &str = "BALANCE_REQUEST_TIMEOUT_SECS";

/// Client configuration: where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the prediction backend (e.g., "http://localhost:8000").
    pub base_url: String,

    /// Timeout for ordinary requests.
    pub request_timeout_secs: u64,

    /// Timeout for multipart uploads.
    pub upload_timeout_secs: u64,

    /// Timeout for the liveness probe.
    pub health_timeout_secs: u64,

    /// How long a dashboard snapshot is reused before a refetch is required.
    pub dashboard_freshness_secs: u64,

    /// Default period for dashboard auto-refresh.
    pub auto_refresh_minutes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            upload_timeout_secs: 60,
            health_timeout_secs: 5,
            dashboard_freshness_secs: 300,
            auto_refresh_minutes: 5,
        }
    }
}

impl Settings {
    /// Defaults overridden by `BALANCE_API_URL` / `BALANCE_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Self::default();

        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                settings.base_url = url;
            }
        }

        if let Ok(raw) = std::env::var(ENV_REQUEST_TIMEOUT) {
            settings.request_timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_REQUEST_TIMEOUT} must be a whole number, got '{raw}'"))
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("Invalid settings file: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0
            || self.upload_timeout_secs == 0
            || self.health_timeout_secs == 0
        {
            return Err(CoreError::Config("timeouts must be greater than zero".into()));
        }
        if self.auto_refresh_minutes == 0 {
            return Err(CoreError::Config("auto_refresh_minutes must be greater than zero".into()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn api_root(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn dashboard_freshness(&self) -> Duration {
        Duration::from_secs(self.dashboard_freshness_secs)
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_minutes * 60)
    }
}
