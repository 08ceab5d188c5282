//! Real play-time accounting
//!
//! Accumulates wall time spent in the playing state from play/pause
//! timestamps. The integrity check compares this against the position the
//! player claims.

use std::time::{Duration, Instant};

/// Stopwatch over play/pause transitions
#[derive(Debug, Clone, Default)]
pub struct PlayClock {
    accumulated: Duration,
    started: Option<Instant>,
}

impl PlayClock {
    /// Create stopped clock
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting; no-op if already running
    pub fn start(&mut self, now: Instant) {
        if self.started.is_none() {
            self.started = Some(now);
        }
    }

    /// Stop counting and bank the running segment
    pub fn stop(&mut self, now: Instant) {
        if let Some(started) = self.started.take() {
            self.accumulated += now.saturating_duration_since(started);
        }
    }

    /// Total play time up to `now`
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .started
            .map_or(Duration::ZERO, |s| now.saturating_duration_since(s));
        self.accumulated + running
    }

    /// Whether the clock is running
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Forget everything and stop
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
