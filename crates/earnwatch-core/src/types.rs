//! Core types for the watch guard
//!
//! - Video identifiers
//! - Watch sessions (the persisted progress record)
//! - Violation counters

use serde::{Deserialize, Serialize};

/// Identifier of a video as the backend knows it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Create new video ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Watch progress for one video
///
/// All times are seconds. `max_watched_time` is the high-water-mark: the
/// furthest position legitimately reached. It never exceeds `duration`
/// once the duration is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSession {
    /// Video this session tracks
    pub video_id: VideoId,
    /// Last observed playback position
    pub current_time: f64,
    /// High-water-mark
    pub max_watched_time: f64,
    /// Video duration, 0 until the player reports it
    pub duration: f64,
    /// Whether completion was reached
    #[serde(default)]
    pub completed: bool,
}

impl WatchSession {
    /// Fresh session starting at zero
    #[inline]
    #[must_use]
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            current_time: 0.0,
            max_watched_time: 0.0,
            duration: 0.0,
            completed: false,
        }
    }

    /// With a known duration
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// With restored positions
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, current_time: f64, max_watched_time: f64) -> Self {
        self.current_time = current_time;
        self.max_watched_time = max_watched_time;
        self
    }

    /// Check the persisted-state invariants
    ///
    /// A session is consistent when every time is finite and non-negative
    /// and the high-water-mark does not pass the duration.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let finite = [self.current_time, self.max_watched_time, self.duration]
            .iter()
            .all(|t| t.is_finite() && *t >= 0.0);
        finite && self.max_watched_time <= self.duration
    }

    /// Raise the high-water-mark to `position`, clamped to duration
    ///
    /// Returns `true` if the mark moved.
    pub fn advance_to(&mut self, position: f64) -> bool {
        self.current_time = position;
        let capped = if self.duration > 0.0 {
            position.min(self.duration)
        } else {
            position
        };
        if capped > self.max_watched_time {
            self.max_watched_time = capped;
            true
        } else {
            false
        }
    }

    /// Adopt the player's real duration
    ///
    /// The high-water-mark and current position are clamped so the
    /// invariant holds even if a stored duration was stale.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.max_watched_time = self.max_watched_time.min(self.duration);
        self.current_time = self.current_time.min(self.duration);
    }

    /// Drop all progress (tamper reset)
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.max_watched_time = 0.0;
        self.completed = false;
    }

    /// Fraction of the video at the current position (0.0 - 1.0)
    #[inline]
    #[must_use]
    pub fn watched_fraction(&self) -> f64 {
        fraction(self.current_time, self.duration)
    }

    /// Fraction of the video covered by the high-water-mark (0.0 - 1.0)
    #[inline]
    #[must_use]
    pub fn max_reached_fraction(&self) -> f64 {
        fraction(self.max_watched_time, self.duration)
    }
}

fn fraction(value: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        0.0
    } else {
        (value / duration).clamp(0.0, 1.0)
    }
}

/// Tamper counters for one session
///
/// Counts only go up until `reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounter {
    /// Rejected forward-skip attempts
    pub skip_attempts: u32,
    /// Playback-rate changes that had to be reverted
    pub rate_change_count: u32,
}

impl ViolationCounter {
    /// Record a rejected skip, returning the new count
    #[inline]
    pub fn record_skip(&mut self) -> u32 {
        self.skip_attempts = self.skip_attempts.saturating_add(1);
        self.skip_attempts
    }

    /// Record a reverted rate change, returning the new count
    #[inline]
    pub fn record_rate_change(&mut self) -> u32 {
        self.rate_change_count = self.rate_change_count.saturating_add(1);
        self.rate_change_count
    }

    /// Clear both counters
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_serializes_camel_case() {
        let session = WatchSession::new(VideoId::new("v1"))
            .with_duration(100.0)
            .with_progress(12.5, 20.0);
        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["videoId"], "v1");
        assert_eq!(json["currentTime"], 12.5);
        assert_eq!(json["maxWatchedTime"], 20.0);
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn session_consistency() {
        let ok = WatchSession::new("v".into())
            .with_duration(100.0)
            .with_progress(10.0, 50.0);
        assert!(ok.is_consistent());

        let over = ok.clone().with_progress(10.0, 150.0);
        assert!(!over.is_consistent());

        let negative = ok.clone().with_progress(-1.0, 10.0);
        assert!(!negative.is_consistent());

        let nan = ok.with_progress(f64::NAN, 10.0);
        assert!(!nan.is_consistent());
    }

    #[test]
    fn advance_is_clamped_to_duration() {
        let mut session = WatchSession::new("v".into()).with_duration(100.0);

        assert!(session.advance_to(40.0));
        assert!(!session.advance_to(30.0));
        assert_eq!(session.max_watched_time, 40.0);
        assert_eq!(session.current_time, 30.0);

        assert!(session.advance_to(120.0));
        assert_eq!(session.max_watched_time, 100.0);
    }

    #[test]
    fn set_duration_clamps_progress() {
        let mut session = WatchSession::new("v".into())
            .with_duration(200.0)
            .with_progress(150.0, 180.0);
        session.set_duration(100.0);

        assert_eq!(session.max_watched_time, 100.0);
        assert_eq!(session.current_time, 100.0);
        assert!(session.is_consistent());
    }

    #[test]
    fn fractions() {
        let session = WatchSession::new("v".into())
            .with_duration(200.0)
            .with_progress(50.0, 100.0);
        assert_eq!(session.watched_fraction(), 0.25);
        assert_eq!(session.max_reached_fraction(), 0.5);

        let unknown = WatchSession::new("v".into());
        assert_eq!(unknown.watched_fraction(), 0.0);
    }

    #[test]
    fn violation_counter_counts_and_resets() {
        let mut counter = ViolationCounter::default();
        assert_eq!(counter.record_skip(), 1);
        assert_eq!(counter.record_skip(), 2);
        assert_eq!(counter.record_rate_change(), 1);

        counter.reset();
        assert_eq!(counter, ViolationCounter::default());
    }
}
