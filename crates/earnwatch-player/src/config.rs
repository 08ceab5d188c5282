//! Application configuration
//!
//! One TOML file with a `[guard]` and an `[api]` table plus the state
//! directory. Every key is optional.
//!
//! ```toml
//! state_dir = "/var/lib/earnwatch"
//!
//! [guard]
//! skip_tolerance_secs = 2.0
//!
//! [api]
//! base_url = "https://api.example.com/api/v1"
//! ```

use earnwatch_api::ApiConfig;
use earnwatch_core::{ConfigError, GuardConfig, VideoId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory for persisted progress
pub const DEFAULT_STATE_DIR: &str = ".earnwatch";

/// Everything a watch session needs to be configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarnwatchConfig {
    /// Monitor tolerances and intervals
    pub guard: GuardConfig,
    /// Backend location and retry policy
    pub api: ApiConfig,
    /// Where `FileStorage` keeps progress
    pub state_dir: PathBuf,
    /// Page URL prefix used when sharing a video
    pub share_base_url: String,
}

impl Default for EarnwatchConfig {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),
            api: ApiConfig::default(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            share_base_url: "http://localhost:3000/watch".to_string(),
        }
    }
}

impl EarnwatchConfig {
    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::InvalidValue` if the guard section is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`EarnwatchConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check both sections
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.guard.validate()?;
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api.max_complete_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_complete_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Public page of a video
    #[must_use]
    pub fn share_url(&self, video_id: &VideoId) -> String {
        format!("{}/{}", self.share_base_url.trim_end_matches('/'), video_id)
    }
}
