//! Task Schedule
//!
//! The four periodic tasks of a watch session as named tokio intervals:
//! - `WatchTick`: advance the high-water-mark, detect skips (1s)
//! - `IntegrityCheck`: position against real play time (2s)
//! - `RateCheck`: playback rate (1s)
//! - `PersistSave`: write progress to storage (5s)
//!
//! All of them live in one value, so dropping the schedule cancels every
//! task at once. Nothing fires at t=0; the first firing of each task is
//! one period after creation.

use earnwatch_core::GuardConfig;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A periodic task that is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledTask {
    /// Watch tick
    WatchTick,
    /// Integrity check
    IntegrityCheck,
    /// Rate check
    RateCheck,
    /// Progress save
    PersistSave,
}

impl ScheduledTask {
    /// Every task, in priority order
    pub const ALL: [Self; 4] = [
        Self::WatchTick,
        Self::IntegrityCheck,
        Self::RateCheck,
        Self::PersistSave,
    ];

    /// Name for logs
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::WatchTick => "watch_tick",
            Self::IntegrityCheck => "integrity_check",
            Self::RateCheck => "rate_check",
            Self::PersistSave => "persist_save",
        }
    }

    /// Period taken from config
    #[must_use]
    pub fn period(self, config: &GuardConfig) -> Duration {
        match self {
            Self::WatchTick => config.tick_interval(),
            Self::IntegrityCheck => config.integrity_interval(),
            Self::RateCheck => config.rate_check_interval(),
            Self::PersistSave => config.save_interval(),
        }
    }
}

impl std::fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The periodic tasks of one session
#[derive(Debug)]
pub struct TaskSchedule {
    watch_tick: Interval,
    integrity: Interval,
    rate: Interval,
    save: Interval,
}

impl TaskSchedule {
    /// Start all tasks now
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(config: &GuardConfig) -> Self {
        let start = Instant::now();
        let make = |task: ScheduledTask| {
            let period = task.period(config).max(Duration::from_millis(1));
            let mut interval = interval_at(start + period, period);
            // A stalled driver should not replay a burst of missed ticks
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        };
        Self {
            watch_tick: make(ScheduledTask::WatchTick),
            integrity: make(ScheduledTask::IntegrityCheck),
            rate: make(ScheduledTask::RateCheck),
            save: make(ScheduledTask::PersistSave),
        }
    }

    /// Wait for the next due task
    ///
    /// When several are due together they are returned one per call, in
    /// `ScheduledTask::ALL` order. Cancel-safe.
    pub async fn next(&mut self) -> ScheduledTask {
        tokio::select! {
            biased;
            _ = self.watch_tick.tick() => ScheduledTask::WatchTick,
            _ = self.integrity.tick() => ScheduledTask::IntegrityCheck,
            _ = self.rate.tick() => ScheduledTask::RateCheck,
            _ = self.save.tick() => ScheduledTask::PersistSave,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> GuardConfig {
        GuardConfig {
            tick_interval_ms: 100,
            integrity_interval_ms: 200,
            rate_check_interval_ms: 100,
            save_interval_ms: 500,
            ..GuardConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_immediately() {
        let mut schedule = TaskSchedule::new(&fast_config());
        let started = Instant::now();
        let first = schedule.next().await;
        assert_eq!(first, ScheduledTask::WatchTick);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(100));
        assert!(waited < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn firing_counts_follow_periods() {
        let mut schedule = TaskSchedule::new(&fast_config());
        let deadline = Instant::now() + Duration::from_millis(1_050);

        let mut counts = std::collections::HashMap::new();
        loop {
            let task = schedule.next().await;
            if Instant::now() > deadline {
                break;
            }
            *counts.entry(task).or_insert(0u32) += 1;
        }

        assert_eq!(counts[&ScheduledTask::WatchTick], 10);
        assert_eq!(counts[&ScheduledTask::RateCheck], 10);
        assert_eq!(counts[&ScheduledTask::IntegrityCheck], 5);
        assert_eq!(counts[&ScheduledTask::PersistSave], 2);
    }

    #[test]
    fn periods_come_from_config() {
        let config = GuardConfig::default();
        assert_eq!(
            ScheduledTask::WatchTick.period(&config),
            Duration::from_secs(1)
        );
        assert_eq!(
            ScheduledTask::IntegrityCheck.period(&config),
            Duration::from_secs(2)
        );
        assert_eq!(
            ScheduledTask::PersistSave.period(&config),
            Duration::from_secs(5)
        );
        assert_eq!(ScheduledTask::RateCheck.to_string(), "rate_check");
    }
}
