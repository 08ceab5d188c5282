//! Property tests for the playback monitor invariants

use earnwatch_core::prelude::*;
use earnwatch_core::{ResetReason, SeekDecision};
use proptest::prelude::*;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct PropPlayer {
    position: f64,
    rate: f64,
    playing: bool,
}

impl MediaPlayer for PropPlayer {
    fn current_time(&self) -> f64 {
        self.position
    }
    fn duration(&self) -> Option<f64> {
        Some(DURATION)
    }
    fn playback_rate(&self) -> f64 {
        self.rate
    }
    fn is_playing(&self) -> bool {
        self.playing
    }
    fn seek_to(&mut self, position: f64) {
        self.position = position;
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

const DURATION: f64 = 300.0;

#[derive(Debug, Clone)]
enum Op {
    /// Play naturally for n seconds with one tick per second
    Watch(u8),
    /// Devtools-style jump of the playhead, then one tick
    Jump(f64),
    /// Seek through the UI
    Seek(f64),
    /// Tamper with the speed, then run the rate check
    Rate(f64),
    Pause,
    Play,
    Integrity,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u8..20).prop_map(Op::Watch),
        2 => (0.0..DURATION).prop_map(Op::Jump),
        2 => (0.0..DURATION).prop_map(Op::Seek),
        1 => prop_oneof![Just(0.5), Just(1.0), Just(2.0), Just(16.0)].prop_map(Op::Rate),
        1 => Just(Op::Pause),
        1 => Just(Op::Play),
        1 => Just(Op::Integrity),
    ]
}

struct Harness {
    monitor: PlaybackMonitor,
    player: PropPlayer,
    start: Instant,
    elapsed: Duration,
}

impl Harness {
    fn new() -> Self {
        let mut player = PropPlayer {
            rate: 1.0,
            ..PropPlayer::default()
        };
        let mut monitor = PlaybackMonitor::new(VideoId::new("prop"), GuardConfig::default(), None);
        let start = Instant::now();
        monitor.on_ready(&mut player);
        monitor.on_play(start);
        player.play();
        Self {
            monitor,
            player,
            start,
            elapsed: Duration::ZERO,
        }
    }

    fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    fn advance(&mut self, secs: u64) {
        self.elapsed += Duration::from_secs(secs);
    }

    /// Apply an op; returns true if a reset happened
    fn apply(&mut self, op: &Op) -> bool {
        let mut reset = false;
        let mut note = |event: Option<MonitorEvent>| {
            if matches!(event, Some(MonitorEvent::Reset { .. })) {
                reset = true;
            }
        };
        match op {
            Op::Watch(n) => {
                for _ in 0..*n {
                    self.advance(1);
                    if self.player.playing {
                        self.player.position = (self.player.position + 1.0).min(DURATION);
                    }
                    let now = self.now();
                    note(self.monitor.tick(&mut self.player, now));
                }
            }
            Op::Jump(to) => {
                self.player.position = *to;
                self.advance(1);
                let now = self.now();
                note(self.monitor.tick(&mut self.player, now));
            }
            Op::Seek(to) => {
                let now = self.now();
                if matches!(
                    self.monitor.request_seek(&mut self.player, *to, now),
                    SeekDecision::Reset(_)
                ) {
                    note(Some(MonitorEvent::Reset {
                        reason: ResetReason::SkipAttempts(0),
                    }));
                }
            }
            Op::Rate(rate) => {
                self.player.rate = *rate;
                let now = self.now();
                note(self.monitor.check_rate(&mut self.player, now));
            }
            Op::Pause => {
                self.player.pause();
                let now = self.now();
                self.monitor.on_pause(now);
            }
            Op::Play => {
                let now = self.now();
                if self.monitor.on_play(now) {
                    self.player.play();
                } else {
                    self.player.pause();
                }
            }
            Op::Integrity => {
                let now = self.now();
                note(self.monitor.check_integrity(&mut self.player, now));
            }
        }
        reset
    }
}

proptest! {
    #[test]
    fn prop_high_water_mark_monotonic_until_reset(ops in prop::collection::vec(op(), 1..60)) {
        let mut h = Harness::new();
        let mut prev = h.monitor.session().max_watched_time;

        for op in &ops {
            let reset = h.apply(op);
            let max = h.monitor.session().max_watched_time;
            if reset {
                prop_assert_eq!(max, 0.0);
            } else {
                prop_assert!(max >= prev, "max went {} -> {} on {:?}", prev, max, op);
            }
            prop_assert!(max <= DURATION);
            prev = max;
        }
    }

    #[test]
    fn prop_far_seeks_are_rejected(watched in 1u8..60, beyond in 2.5f64..200.0) {
        let mut h = Harness::new();
        h.apply(&Op::Watch(watched));
        let max = h.monitor.session().max_watched_time;
        let before = h.monitor.violations().skip_attempts;

        let target = (max + beyond).min(DURATION);
        prop_assume!(target > max + GuardConfig::default().skip_tolerance_secs);
        prop_assume!(!h.monitor.near_end());

        let now = h.now();
        let decision = h.monitor.request_seek(&mut h.player, target, now);
        let rejected = matches!(decision, SeekDecision::Rejected { .. });
        prop_assert!(rejected, "unexpected {:?}", decision);
        prop_assert_eq!(h.player.position, max);
        prop_assert_eq!(h.monitor.violations().skip_attempts, before + 1);
    }

    #[test]
    fn prop_backward_seeks_always_allowed(watched in 1u8..60, back in 0.0f64..1.0) {
        let mut h = Harness::new();
        h.apply(&Op::Watch(watched));
        let max = h.monitor.session().max_watched_time;
        let target = max * back;

        let now = h.now();
        let decision = h.monitor.request_seek(&mut h.player, target, now);
        prop_assert_eq!(decision, SeekDecision::Allowed { position: target });
        prop_assert_eq!(h.monitor.violations().skip_attempts, 0);
    }
}

#[test]
fn completion_exactly_once_at_duration_boundary() {
    let mut player = PropPlayer {
        rate: 1.0,
        ..PropPlayer::default()
    };
    let mut monitor = PlaybackMonitor::new(VideoId::new("c"), GuardConfig::default(), None);
    let t0 = Instant::now();
    monitor.on_ready(&mut player);
    monitor.on_play(t0);

    let mut completions = 0;
    for s in 1..=310u64 {
        player.position = (s as f64).min(DURATION - 0.5);
        if let Some(MonitorEvent::Completed { .. }) =
            monitor.tick(&mut player, t0 + Duration::from_secs(s))
        {
            completions += 1;
        }
    }

    assert_eq!(completions, 1);
    assert_eq!(monitor.state(), MonitorState::Completed);
}
