//! Backend configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend location and retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts `mark_complete` makes before giving up (401s excluded)
    pub max_complete_attempts: u32,
    /// First backoff delay; doubles after every failed attempt
    pub backoff_base_ms: u64,
    /// Token refreshes one `mark_complete` call may perform
    pub max_auth_refreshes: u32,
    /// `videoType` sent with verification
    pub video_type: String,
}

impl ApiConfig {
    /// Defaults pointed at `base_url`
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retries(mut self, max_attempts: u32, backoff_base: Duration) -> Self {
        self.max_complete_attempts = max_attempts;
        self.backoff_base_ms = u64::try_from(backoff_base.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With video type tag
    #[inline]
    #[must_use]
    pub fn with_video_type(mut self, video_type: impl Into<String>) -> Self {
        self.video_type = video_type.into();
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the attempt following `failures` failed attempts
    ///
    /// 1 failure waits the base delay, 2 wait twice that, and so on.
    #[must_use]
    pub fn backoff(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1 << exp))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 15,
            max_complete_attempts: 3,
            backoff_base_ms: 1_000,
            max_auth_refreshes: 3,
            video_type: "task".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff() {
        let config = ApiConfig::default();
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(2), Duration::from_secs(2));
        assert_eq!(config.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn builder() {
        let config = ApiConfig::new("https://api.example.com")
            .with_retries(5, Duration::from_millis(10))
            .with_video_type("bonus");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.max_complete_attempts, 5);
        assert_eq!(config.backoff(2), Duration::from_millis(20));
        assert_eq!(config.video_type, "bonus");
    }
}
