//! Playback Monitor
//!
//! Owns one `WatchSession` and decides, on every tick, whether the
//! player's position is legitimate:
//! - raises the high-water-mark as the video plays
//! - snaps forward skips back to the high-water-mark and counts them
//! - forces the playback rate back to 1.0 and counts changes
//! - compares the claimed position with real play time
//! - resets all progress when a threshold is crossed
//! - detects completion exactly once
//!
//! The monitor holds no timers. A driver calls [`PlaybackMonitor::tick`],
//! [`PlaybackMonitor::check_integrity`] and [`PlaybackMonitor::check_rate`]
//! on its own schedule and reacts to the returned events (clearing the
//! store, reporting completion, showing warnings).

mod clock;
mod state;

pub use clock::PlayClock;
pub use state::{allowed_transitions, is_allowed, MonitorState};

use crate::config::GuardConfig;
use crate::media::MediaPlayer;
use crate::types::{VideoId, ViolationCounter, WatchSession};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Allowed deviation from normal speed before a rate counts as changed
const RATE_EPSILON: f64 = 1e-3;

/// Positions closer than this are the same position
const POSITION_EPSILON: f64 = 1e-3;

/// Normal playback speed
pub const NORMAL_RATE: f64 = 1.0;

/// Why progress was wiped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResetReason {
    /// Too many rejected forward skips
    SkipAttempts(u32),
    /// Too many playback-rate changes
    RateChanges(u32),
    /// Claimed position outran real play time
    IntegrityMismatch {
        /// Position the player reported
        claimed: f64,
        /// Position justified by real play time
        credited: f64,
    },
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SkipAttempts(n) => write!(f, "{n} skip attempts"),
            Self::RateChanges(n) => write!(f, "{n} playback speed changes"),
            Self::IntegrityMismatch { claimed, credited } => write!(
                f,
                "position {claimed:.1}s not backed by play time ({credited:.1}s)"
            ),
        }
    }
}

/// Something the driver must react to
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Position accepted
    Progress {
        /// Position observed this tick
        current: f64,
        /// High-water-mark after the tick
        max_watched: f64,
    },
    /// Forward skip snapped back
    SkipRejected {
        /// Position the player had jumped to
        attempted: f64,
        /// Position restored
        snapped_to: f64,
        /// Rejected skips so far
        attempts: u32,
        /// Rejections left before a reset
        remaining: u32,
    },
    /// Playback rate forced back to normal
    RateCorrected {
        /// Rate found on the player
        observed: f64,
        /// Corrections so far
        count: u32,
        /// Corrections left before a reset
        remaining: u32,
    },
    /// Progress wiped; persisted state must be cleared
    Reset {
        /// Why
        reason: ResetReason,
    },
    /// Cool-down over; playback may resume
    CooldownFinished,
    /// Watched to the end; report completion
    Completed {
        /// Video duration in seconds
        duration: f64,
    },
}

/// Outcome of a user seek request
#[derive(Debug, Clone, PartialEq)]
pub enum SeekDecision {
    /// Seek applied as requested
    Allowed {
        /// New position
        position: f64,
    },
    /// Seek slightly past the high-water-mark, applied at the mark
    Clamped {
        /// Requested position
        requested: f64,
        /// Position applied
        position: f64,
    },
    /// Seek beyond the high-water-mark, refused and counted
    Rejected {
        /// Requested position
        requested: f64,
        /// Position restored
        snapped_to: f64,
        /// Rejected skips so far
        attempts: u32,
    },
    /// The rejection crossed the threshold and progress was wiped
    Reset(ResetReason),
    /// Seeking is disabled (cool-down)
    Blocked,
}

/// Per-session playback policy
#[derive(Debug)]
pub struct PlaybackMonitor {
    config: GuardConfig,
    session: WatchSession,
    violations: ViolationCounter,
    state: MonitorState,
    clock: PlayClock,
    /// Position credited without play time (restored high-water-mark)
    resume_credit: f64,
    /// Play time observed at the previous tick
    last_tick_played: Duration,
    reset_deadline: Option<Instant>,
    restore_pending: bool,
}

impl PlaybackMonitor {
    /// Create monitor for a video, resuming persisted progress if any
    #[must_use]
    pub fn new(video_id: VideoId, config: GuardConfig, restored: Option<WatchSession>) -> Self {
        let restored = restored.filter(|s| s.video_id == video_id && !s.completed);
        let (session, restore_pending) = match restored {
            Some(session) => {
                info!(
                    %video_id,
                    current = session.current_time,
                    max_watched = session.max_watched_time,
                    "Resuming watch session"
                );
                (session, true)
            }
            None => (WatchSession::new(video_id), false),
        };

        Self {
            config,
            resume_credit: session.max_watched_time,
            session,
            violations: ViolationCounter::default(),
            state: MonitorState::Idle,
            clock: PlayClock::new(),
            last_tick_played: Duration::ZERO,
            reset_deadline: None,
            restore_pending,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Session snapshot
    #[inline]
    #[must_use]
    pub fn session(&self) -> &WatchSession {
        &self.session
    }

    /// Violation counters
    #[inline]
    #[must_use]
    pub fn violations(&self) -> ViolationCounter {
        self.violations
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Whether the video was watched to the end
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == MonitorState::Completed
    }

    /// Whether the high-water-mark is close enough to the end that skip
    /// checks are suppressed
    #[must_use]
    pub fn near_end(&self) -> bool {
        let duration = self.session.duration;
        duration > 0.0 && self.session.max_watched_time >= duration - self.config.near_end_window_secs
    }

    /// Whether a forward skip from `position` would land inside watched
    /// territory
    #[inline]
    #[must_use]
    pub fn can_skip_forward(&self, position: f64) -> bool {
        position + POSITION_EPSILON < self.session.max_watched_time
    }

    /// Adopt the player's duration and apply a pending restore
    ///
    /// Returns `true` once the duration is known.
    pub fn on_ready<P: MediaPlayer + ?Sized>(&mut self, player: &mut P) -> bool {
        let Some(duration) = player.duration().filter(|d| d.is_finite() && *d > 0.0) else {
            return false;
        };

        if (self.session.duration - duration).abs() > f64::EPSILON {
            debug!(video_id = %self.session.video_id, duration, "Player reported duration");
            self.session.set_duration(duration);
            self.resume_credit = self.resume_credit.min(duration);
        }

        if self.restore_pending {
            self.restore_pending = false;
            if self.session.current_time > 0.0 {
                player.seek_to(self.session.current_time);
                info!(
                    video_id = %self.session.video_id,
                    position = self.session.current_time,
                    "Restored playback position"
                );
            }
        }
        true
    }

    /// Player started playing
    ///
    /// Returns `false` when playback is not allowed (cool-down or
    /// completed); the caller should pause the player again.
    pub fn on_play(&mut self, now: Instant) -> bool {
        match self.state {
            MonitorState::Playing => true,
            MonitorState::Idle | MonitorState::Paused => {
                self.transition(MonitorState::Playing);
                self.clock.start(now);
                true
            }
            MonitorState::Resetting | MonitorState::Completed => false,
        }
    }

    /// Player paused
    pub fn on_pause(&mut self, now: Instant) {
        if self.state == MonitorState::Playing {
            self.clock.stop(now);
            self.transition(MonitorState::Paused);
        }
    }

    /// Watch tick: advance the high-water-mark or reject a skip
    ///
    /// While resetting, the tick also ends the cool-down once it expires.
    pub fn tick<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        now: Instant,
    ) -> Option<MonitorEvent> {
        match self.state {
            MonitorState::Resetting => return self.finish_cooldown(now),
            MonitorState::Playing => {}
            _ => return None,
        }

        let position = player.current_time();
        if !position.is_finite() {
            return None;
        }

        let played = self.clock.elapsed(now);
        let since_last = played.saturating_sub(self.last_tick_played);
        self.last_tick_played = played;

        // A late tick legitimately covers more ground than one interval
        let late_by = since_last
            .saturating_sub(self.config.tick_interval())
            .as_secs_f64();
        let ceiling = self.session.max_watched_time + self.config.skip_tolerance_secs + late_by;

        if !self.near_end() && position > ceiling {
            return Some(self.reject_skip(player, position, now));
        }

        let duration = self.session.duration;
        if duration > 0.0 && position >= duration - self.config.completion_margin_secs {
            return Some(self.complete(player, now));
        }

        if self.session.advance_to(position) {
            debug!(
                video_id = %self.session.video_id,
                max_watched = self.session.max_watched_time,
                "High-water-mark advanced"
            );
        }
        Some(MonitorEvent::Progress {
            current: position,
            max_watched: self.session.max_watched_time,
        })
    }

    /// Integrity check: claimed position against real play time
    pub fn check_integrity<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        now: Instant,
    ) -> Option<MonitorEvent> {
        if self.state != MonitorState::Playing {
            return None;
        }

        let claimed = player.current_time();
        let credited = self.resume_credit + self.clock.elapsed(now).as_secs_f64();
        let threshold = self.config.integrity_threshold_secs;

        if claimed > self.session.max_watched_time + threshold && claimed > credited + threshold {
            warn!(
                video_id = %self.session.video_id,
                claimed,
                credited,
                "Position not backed by play time"
            );
            return Some(self.tamper_reset(
                player,
                now,
                ResetReason::IntegrityMismatch { claimed, credited },
            ));
        }
        None
    }

    /// Rate check: force normal speed and count the change
    pub fn check_rate<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        now: Instant,
    ) -> Option<MonitorEvent> {
        if !matches!(self.state, MonitorState::Playing | MonitorState::Paused) {
            return None;
        }

        let observed = player.playback_rate();
        if (observed - NORMAL_RATE).abs() <= RATE_EPSILON {
            return None;
        }

        player.set_playback_rate(NORMAL_RATE);
        let count = self.violations.record_rate_change();
        warn!(
            video_id = %self.session.video_id,
            observed,
            count,
            "Playback speed changed"
        );

        if count >= self.config.max_rate_changes {
            return Some(self.tamper_reset(player, now, ResetReason::RateChanges(count)));
        }
        Some(MonitorEvent::RateCorrected {
            observed,
            count,
            remaining: self.config.max_rate_changes - count,
        })
    }

    /// User asked to move the playhead
    ///
    /// Backward seeks always pass. Forward seeks pass up to the
    /// high-water-mark; up to `skip_tolerance_secs` beyond it they are
    /// clamped to the mark, further than that they are refused and count
    /// as a skip attempt.
    pub fn request_seek<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        target: f64,
        now: Instant,
    ) -> SeekDecision {
        if self.state == MonitorState::Resetting {
            return SeekDecision::Blocked;
        }

        let mut target = if target.is_finite() { target.max(0.0) } else { 0.0 };
        if self.session.duration > 0.0 {
            target = target.min(self.session.duration);
        }

        let max = self.session.max_watched_time;
        if self.is_completed() || target <= max {
            player.seek_to(target);
            self.session.current_time = target;
            return SeekDecision::Allowed { position: target };
        }

        if target <= max + self.config.skip_tolerance_secs || self.near_end() {
            player.seek_to(max);
            self.session.current_time = max;
            return SeekDecision::Clamped {
                requested: target,
                position: max,
            };
        }

        match self.reject_skip(player, target, now) {
            MonitorEvent::SkipRejected {
                snapped_to,
                attempts,
                ..
            } => SeekDecision::Rejected {
                requested: target,
                snapped_to,
                attempts,
            },
            MonitorEvent::Reset { reason } => SeekDecision::Reset(reason),
            other => {
                debug!(?other, "Unexpected skip outcome");
                SeekDecision::Blocked
            }
        }
    }

    /// Relative seek (the ±10s buttons)
    ///
    /// A forward step that starts inside watched territory stops at the
    /// high-water-mark instead of counting as a skip attempt.
    pub fn seek_by<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        delta: f64,
        now: Instant,
    ) -> SeekDecision {
        let from = player.current_time();
        let mut target = from + delta;
        if delta > 0.0 && self.can_skip_forward(from) {
            target = target.min(self.session.max_watched_time);
        }
        self.request_seek(player, target, now)
    }

    fn reject_skip<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        attempted: f64,
        now: Instant,
    ) -> MonitorEvent {
        let snapped_to = self.session.max_watched_time;
        player.seek_to(snapped_to);
        self.session.current_time = snapped_to;

        let attempts = self.violations.record_skip();
        warn!(
            video_id = %self.session.video_id,
            attempted,
            snapped_to,
            attempts,
            "Forward skip rejected"
        );

        if attempts >= self.config.max_skip_attempts {
            return self.tamper_reset(player, now, ResetReason::SkipAttempts(attempts));
        }
        MonitorEvent::SkipRejected {
            attempted,
            snapped_to,
            attempts,
            remaining: self.config.max_skip_attempts - attempts,
        }
    }

    fn tamper_reset<P: MediaPlayer + ?Sized>(
        &mut self,
        player: &mut P,
        now: Instant,
        reason: ResetReason,
    ) -> MonitorEvent {
        warn!(video_id = %self.session.video_id, %reason, "Tamper reset");

        self.session.reset();
        self.violations.reset();
        self.clock.reset();
        self.resume_credit = 0.0;
        self.last_tick_played = Duration::ZERO;

        player.pause();
        player.set_playback_rate(NORMAL_RATE);
        player.seek_to(0.0);

        self.transition(MonitorState::Resetting);
        self.reset_deadline = Some(now + self.config.reset_cooldown());
        MonitorEvent::Reset { reason }
    }

    fn finish_cooldown(&mut self, now: Instant) -> Option<MonitorEvent> {
        match self.reset_deadline {
            Some(deadline) if now >= deadline => {
                self.reset_deadline = None;
                self.transition(MonitorState::Paused);
                info!(video_id = %self.session.video_id, "Reset cool-down finished");
                Some(MonitorEvent::CooldownFinished)
            }
            _ => None,
        }
    }

    fn complete<P: MediaPlayer + ?Sized>(&mut self, player: &mut P, now: Instant) -> MonitorEvent {
        let duration = self.session.duration;
        self.clock.stop(now);
        self.session.current_time = duration;
        self.session.max_watched_time = duration;
        self.session.completed = true;
        player.pause();

        self.transition(MonitorState::Completed);
        info!(video_id = %self.session.video_id, duration, "Video completed");
        MonitorEvent::Completed { duration }
    }

    fn transition(&mut self, to: MonitorState) {
        if is_allowed(self.state, to) {
            debug!(from = ?self.state, ?to, "Monitor transition");
            self.state = to;
        } else {
            #[cfg(feature = "strict-debug")]
            panic!("Illegal monitor transition attempted: {:?} -> {:?}", self.state, to);

            warn!(from = ?self.state, ?to, "Illegal monitor transition ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Player whose position only moves when told to
    #[derive(Debug)]
    struct StubPlayer {
        position: f64,
        duration: Option<f64>,
        rate: f64,
        playing: bool,
        seeks: Vec<f64>,
    }

    impl StubPlayer {
        fn new(duration: f64) -> Self {
            Self {
                position: 0.0,
                duration: Some(duration),
                rate: 1.0,
                playing: false,
                seeks: Vec::new(),
            }
        }
    }

    impl MediaPlayer for StubPlayer {
        fn current_time(&self) -> f64 {
            self.position
        }
        fn duration(&self) -> Option<f64> {
            self.duration
        }
        fn playback_rate(&self) -> f64 {
            self.rate
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn seek_to(&mut self, position: f64) {
            self.position = position;
            self.seeks.push(position);
        }
        fn set_playback_rate(&mut self, rate: f64) {
            self.rate = rate;
        }
        fn play(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn playing_monitor(duration: f64) -> (PlaybackMonitor, StubPlayer, Instant) {
        let mut player = StubPlayer::new(duration);
        let mut monitor = PlaybackMonitor::new(VideoId::new("v1"), GuardConfig::default(), None);
        let t0 = Instant::now();
        assert!(monitor.on_ready(&mut player));
        assert!(monitor.on_play(t0));
        player.play();
        (monitor, player, t0)
    }

    /// Play naturally for `n` seconds, ticking every second
    fn play_for(
        monitor: &mut PlaybackMonitor,
        player: &mut StubPlayer,
        start: Instant,
        from_sec: u64,
        n: u64,
    ) {
        for s in from_sec + 1..=from_sec + n {
            player.position += 1.0;
            monitor.tick(player, start + secs(s));
        }
    }

    #[test]
    fn natural_playback_raises_high_water_mark() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 10);

        assert_eq!(monitor.session().max_watched_time, 10.0);
        assert_eq!(monitor.violations(), ViolationCounter::default());
    }

    #[test]
    fn forward_jump_is_snapped_back() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 10);

        player.position = 60.0;
        let event = monitor.tick(&mut player, t0 + secs(11));

        assert!(matches!(
            event,
            Some(MonitorEvent::SkipRejected {
                attempts: 1,
                remaining: 4,
                ..
            })
        ));
        assert_eq!(player.position, 10.0);
        assert_eq!(monitor.session().max_watched_time, 10.0);
    }

    #[test]
    fn drift_within_tolerance_is_accepted() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 10);

        player.position = 12.0;
        let event = monitor.tick(&mut player, t0 + secs(11));
        assert!(matches!(event, Some(MonitorEvent::Progress { .. })));
        assert_eq!(monitor.session().max_watched_time, 12.0);
    }

    #[test]
    fn late_tick_allows_real_progress() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 10);

        // Tick delayed by 6s of real playing
        player.position = 16.0;
        let event = monitor.tick(&mut player, t0 + secs(16));
        assert!(matches!(event, Some(MonitorEvent::Progress { .. })));
        assert_eq!(monitor.session().max_watched_time, 16.0);
    }

    #[test]
    fn seek_requests() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 30);

        assert_eq!(
            monitor.request_seek(&mut player, 5.0, t0),
            SeekDecision::Allowed { position: 5.0 }
        );
        assert_eq!(
            monitor.request_seek(&mut player, 31.0, t0),
            SeekDecision::Clamped {
                requested: 31.0,
                position: 30.0
            }
        );
        assert_eq!(
            monitor.request_seek(&mut player, 80.0, t0),
            SeekDecision::Rejected {
                requested: 80.0,
                snapped_to: 30.0,
                attempts: 1
            }
        );
        assert_eq!(player.position, 30.0);
    }

    #[test]
    fn fifth_skip_attempt_resets() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 20);

        for attempt in 1..=4 {
            assert!(matches!(
                monitor.request_seek(&mut player, 90.0, t0),
                SeekDecision::Rejected { attempts, .. } if attempts == attempt
            ));
        }
        let decision = monitor.request_seek(&mut player, 90.0, t0);

        assert_eq!(decision, SeekDecision::Reset(ResetReason::SkipAttempts(5)));
        assert_eq!(monitor.state(), MonitorState::Resetting);
        assert_eq!(monitor.session().max_watched_time, 0.0);
        assert_eq!(player.position, 0.0);
        assert!(!player.playing);
    }

    #[test]
    fn third_rate_change_resets() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 20);

        for count in 1..=2 {
            player.rate = 2.0;
            let event = monitor.check_rate(&mut player, t0 + secs(20));
            assert!(matches!(
                event,
                Some(MonitorEvent::RateCorrected { count: c, .. }) if c == count
            ));
            assert_eq!(player.rate, 1.0);
        }

        player.rate = 1.5;
        let event = monitor.check_rate(&mut player, t0 + secs(21));
        assert_eq!(
            event,
            Some(MonitorEvent::Reset {
                reason: ResetReason::RateChanges(3)
            })
        );
        assert_eq!(monitor.session().max_watched_time, 0.0);
    }

    #[test]
    fn normal_rate_is_ignored() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        assert_eq!(monitor.check_rate(&mut player, t0), None);
        assert_eq!(monitor.violations().rate_change_count, 0);
    }

    #[test]
    fn cooldown_blocks_then_releases() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        let reset_at = t0 + secs(5);
        monitor.tamper_reset(&mut player, reset_at, ResetReason::SkipAttempts(5));

        assert!(!monitor.on_play(reset_at + secs(1)));
        assert_eq!(
            monitor.request_seek(&mut player, 0.0, reset_at),
            SeekDecision::Blocked
        );
        assert_eq!(monitor.tick(&mut player, reset_at + secs(2)), None);

        assert_eq!(
            monitor.tick(&mut player, reset_at + secs(3)),
            Some(MonitorEvent::CooldownFinished)
        );
        assert_eq!(monitor.state(), MonitorState::Paused);
        assert!(monitor.on_play(reset_at + secs(4)));
    }

    #[test]
    fn no_reentrant_reset_during_cooldown() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        monitor.tamper_reset(&mut player, t0, ResetReason::SkipAttempts(5));

        player.rate = 3.0;
        assert_eq!(monitor.check_rate(&mut player, t0 + secs(1)), None);
        player.position = 90.0;
        assert_eq!(monitor.check_integrity(&mut player, t0 + secs(1)), None);
    }

    #[test]
    fn integrity_mismatch_resets() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 10);

        // Jump between ticks: 2s of play, position claims 40s
        player.position = 40.0;
        let event = monitor.check_integrity(&mut player, t0 + secs(12));
        assert!(matches!(
            event,
            Some(MonitorEvent::Reset {
                reason: ResetReason::IntegrityMismatch { .. }
            })
        ));
    }

    #[test]
    fn integrity_credits_restored_progress() {
        let restored = WatchSession::new(VideoId::new("v1"))
            .with_duration(100.0)
            .with_progress(50.0, 50.0);
        let mut monitor =
            PlaybackMonitor::new(VideoId::new("v1"), GuardConfig::default(), Some(restored));
        let mut player = StubPlayer::new(100.0);
        let t0 = Instant::now();

        monitor.on_ready(&mut player);
        assert_eq!(player.position, 50.0);
        monitor.on_play(t0);

        player.position = 52.0;
        assert_eq!(monitor.check_integrity(&mut player, t0 + secs(2)), None);
    }

    #[test]
    fn completion_fires_once() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 99);

        player.position = 99.5;
        let first = monitor.tick(&mut player, t0 + secs(100));
        assert_eq!(first, Some(MonitorEvent::Completed { duration: 100.0 }));
        assert!(monitor.is_completed());
        assert!(monitor.session().completed);

        player.position = 99.9;
        assert_eq!(monitor.tick(&mut player, t0 + secs(101)), None);
    }

    #[test]
    fn jump_to_end_is_not_completion() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 10);

        player.position = 99.8;
        let event = monitor.tick(&mut player, t0 + secs(11));
        assert!(matches!(event, Some(MonitorEvent::SkipRejected { .. })));
        assert!(!monitor.is_completed());
    }

    #[test]
    fn near_end_suppresses_skip_checks() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 98);
        assert!(monitor.near_end());

        player.position = 99.2;
        let event = monitor.tick(&mut player, t0 + secs(99));
        assert!(matches!(event, Some(MonitorEvent::Progress { .. })));
        assert_eq!(monitor.violations().skip_attempts, 0);
    }

    #[test]
    fn pause_stops_ticks() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        monitor.on_pause(t0 + secs(1));
        player.position = 50.0;
        assert_eq!(monitor.tick(&mut player, t0 + secs(2)), None);
        assert_eq!(monitor.state(), MonitorState::Paused);
    }

    #[test]
    fn restored_completed_session_is_ignored() {
        let mut done = WatchSession::new(VideoId::new("v1")).with_duration(10.0);
        done.completed = true;
        let monitor = PlaybackMonitor::new(VideoId::new("v1"), GuardConfig::default(), Some(done));
        assert_eq!(monitor.session().max_watched_time, 0.0);
        assert!(!monitor.session().completed);
    }

    #[test]
    fn stale_restored_duration_is_clamped() {
        let restored = WatchSession::new(VideoId::new("v1"))
            .with_duration(200.0)
            .with_progress(150.0, 180.0);
        let mut monitor =
            PlaybackMonitor::new(VideoId::new("v1"), GuardConfig::default(), Some(restored));
        let mut player = StubPlayer::new(100.0);

        monitor.on_ready(&mut player);
        assert_eq!(monitor.session().duration, 100.0);
        assert_eq!(monitor.session().max_watched_time, 100.0);
    }

    #[test]
    fn forward_button_inside_watched_range_never_counts() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 30);

        for _ in 0..6 {
            monitor.request_seek(&mut player, 25.0, t0);
            assert!(monitor.can_skip_forward(player.position));
            assert_eq!(
                monitor.seek_by(&mut player, 10.0, t0),
                SeekDecision::Allowed { position: 30.0 }
            );
        }

        assert_eq!(monitor.violations(), ViolationCounter::default());
        assert_eq!(monitor.state(), MonitorState::Playing);
        assert_eq!(monitor.session().max_watched_time, 30.0);
        assert_eq!(player.position, 30.0);
    }

    #[test]
    fn forward_button_at_the_mark_is_still_checked() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 30);

        assert_eq!(
            monitor.seek_by(&mut player, 10.0, t0),
            SeekDecision::Rejected {
                requested: 40.0,
                snapped_to: 30.0,
                attempts: 1
            }
        );
    }

    #[test]
    fn skip_forward_availability() {
        let (mut monitor, mut player, t0) = playing_monitor(100.0);
        play_for(&mut monitor, &mut player, t0, 0, 30);

        assert!(monitor.can_skip_forward(10.0));
        assert!(!monitor.can_skip_forward(30.0));
    }
}
