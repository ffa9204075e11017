//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::{Duration, DEFAULT_ENCODING_PREFERENCES};

/// Default backend base URL (local development server)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default delay between status polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Default attempt budget for the status poller
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 80;

/// Application configuration.
/// All fields are optional to support partial configs and merging. The
/// merged value is built once at startup and injected into constructors;
/// nothing reads it as ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url: Option<String>,
    pub api_token: Option<String>,
    pub avatar_id: Option<String>,
    pub max_duration: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    pub encodings: Option<Vec<String>>,
    pub poll_past_transport_errors: Option<bool>,
    pub clipboard: Option<bool>,
    pub notify: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            backend_url: Some(DEFAULT_BACKEND_URL.to_string()),
            api_token: None,
            avatar_id: None,
            max_duration: Some("5m".to_string()),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            poll_max_attempts: Some(DEFAULT_POLL_MAX_ATTEMPTS),
            encodings: Some(
                DEFAULT_ENCODING_PREFERENCES
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            ),
            poll_past_transport_errors: Some(false),
            clipboard: Some(false),
            notify: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            backend_url: other.backend_url.or(self.backend_url),
            api_token: other.api_token.or(self.api_token),
            avatar_id: other.avatar_id.or(self.avatar_id),
            max_duration: other.max_duration.or(self.max_duration),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            poll_max_attempts: other.poll_max_attempts.or(self.poll_max_attempts),
            encodings: other.encodings.or(self.encodings),
            poll_past_transport_errors: other
                .poll_past_transport_errors
                .or(self.poll_past_transport_errors),
            clipboard: other.clipboard.or(self.clipboard),
            notify: other.notify.or(self.notify),
        }
    }

    /// Get backend URL, or the default if not set
    pub fn backend_url_or_default(&self) -> &str {
        self.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL)
    }

    /// Get max_duration as parsed Duration, or default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Get poll interval in milliseconds, or default if not set
    pub fn poll_interval_ms_or_default(&self) -> u64 {
        self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    /// Get poll attempt budget, or default if not set. Zero is treated as
    /// unset; a budget of zero would make every poll a timeout.
    pub fn poll_max_attempts_or_default(&self) -> u32 {
        match self.poll_max_attempts {
            Some(0) | None => DEFAULT_POLL_MAX_ATTEMPTS,
            Some(n) => n,
        }
    }

    /// Get the ordered encoding preference list, or the default
    pub fn encodings_or_default(&self) -> Vec<String> {
        self.encodings.clone().unwrap_or_else(|| {
            DEFAULT_ENCODING_PREFERENCES
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
    }

    /// Whether transport errors consume attempts instead of aborting
    pub fn poll_past_transport_errors_or_default(&self) -> bool {
        self.poll_past_transport_errors.unwrap_or(false)
    }

    /// Get clipboard setting, or false if not set
    pub fn clipboard_or_default(&self) -> bool {
        self.clipboard.unwrap_or(false)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }
}
