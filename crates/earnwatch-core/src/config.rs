//! Guard configuration
//!
//! Defaults carry the platform's production constants. Every field may be
//! overridden from TOML; missing fields keep their default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tolerances, thresholds and task intervals for one watch session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// How far past the high-water-mark a position may drift before it
    /// counts as a forward skip
    pub skip_tolerance_secs: f64,
    /// Rejected skips that force a tamper reset
    pub max_skip_attempts: u32,
    /// Reverted rate changes that force a tamper reset
    pub max_rate_changes: u32,
    /// Margin by which a position may outrun real play time
    pub integrity_threshold_secs: f64,
    /// Window before the end in which skip checks are suppressed
    pub near_end_window_secs: f64,
    /// Distance from the end at which the video counts as completed
    pub completion_margin_secs: f64,
    /// Cool-down after a tamper reset
    pub reset_cooldown_ms: u64,
    /// Watch tick period
    pub tick_interval_ms: u64,
    /// Integrity check period
    pub integrity_interval_ms: u64,
    /// Rate check period
    pub rate_check_interval_ms: u64,
    /// Progress persistence period
    pub save_interval_ms: u64,
    /// Step of the rewind/forward buttons
    pub skip_step_secs: f64,
    /// Lifetime of a skip popup
    pub popup_ttl_ms: u64,
}

impl GuardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With skip tolerance
    #[inline]
    #[must_use]
    pub fn with_skip_tolerance(mut self, secs: f64) -> Self {
        self.skip_tolerance_secs = secs;
        self
    }

    /// With violation thresholds
    #[inline]
    #[must_use]
    pub fn with_thresholds(mut self, max_skip_attempts: u32, max_rate_changes: u32) -> Self {
        self.max_skip_attempts = max_skip_attempts;
        self.max_rate_changes = max_rate_changes;
        self
    }

    /// With reset cool-down
    #[inline]
    #[must_use]
    pub fn with_reset_cooldown(mut self, cooldown: Duration) -> Self {
        self.reset_cooldown_ms = duration_ms(cooldown);
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::InvalidValue` if validation fails
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the monitor misbehave
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("tick_interval_ms", self.tick_interval_ms),
            ("integrity_interval_ms", self.integrity_interval_ms),
            ("rate_check_interval_ms", self.rate_check_interval_ms),
            ("save_interval_ms", self.save_interval_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "interval must be positive".to_string(),
                });
            }
        }

        let seconds = [
            ("skip_tolerance_secs", self.skip_tolerance_secs),
            ("integrity_threshold_secs", self.integrity_threshold_secs),
            ("near_end_window_secs", self.near_end_window_secs),
            ("completion_margin_secs", self.completion_margin_secs),
            ("skip_step_secs", self.skip_step_secs),
        ];
        for (field, value) in seconds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("expected a non-negative number of seconds, got {value}"),
                });
            }
        }

        if self.max_skip_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_skip_attempts",
                reason: "threshold must be at least 1".to_string(),
            });
        }
        if self.max_rate_changes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_rate_changes",
                reason: "threshold must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Watch tick period
    #[inline]
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Integrity check period
    #[inline]
    #[must_use]
    pub fn integrity_interval(&self) -> Duration {
        Duration::from_millis(self.integrity_interval_ms)
    }

    /// Rate check period
    #[inline]
    #[must_use]
    pub fn rate_check_interval(&self) -> Duration {
        Duration::from_millis(self.rate_check_interval_ms)
    }

    /// Persistence period
    #[inline]
    #[must_use]
    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }

    /// Cool-down after a tamper reset
    #[inline]
    #[must_use]
    pub fn reset_cooldown(&self) -> Duration {
        Duration::from_millis(self.reset_cooldown_ms)
    }

    /// Popup lifetime
    #[inline]
    #[must_use]
    pub fn popup_ttl(&self) -> Duration {
        Duration::from_millis(self.popup_ttl_ms)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            skip_tolerance_secs: 2.0,
            max_skip_attempts: 5,
            max_rate_changes: 3,
            integrity_threshold_secs: 5.0,
            near_end_window_secs: 2.0,
            completion_margin_secs: 0.5,
            reset_cooldown_ms: 3_000,
            tick_interval_ms: 1_000,
            integrity_interval_ms: 2_000,
            rate_check_interval_ms: 1_000,
            save_interval_ms: 5_000,
            skip_step_secs: 10.0,
            popup_ttl_ms: 1_000,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
