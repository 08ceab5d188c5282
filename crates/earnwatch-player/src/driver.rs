//! Watch session driver
//!
//! One task owns the monitor, the player handle, the progress store and
//! the shell, and multiplexes three inputs in a single `select!`:
//! - due periodic tasks from the [`TaskSchedule`]
//! - user commands from a channel
//! - results of spawned background work (likes, shares)
//!
//! Likes and shares are spawned so a slow backend never delays a tick.
//! When the video completes, or the session is unmounted, the schedule
//! is dropped and every periodic task stops with it.

use crate::error::ShareError;
use crate::notice::Notice;
use crate::popup::PopupKind;
use crate::schedule::{ScheduledTask, TaskSchedule};
use crate::share::{ShareAction, ShareOutcome, SharePayload};
use crate::shell::{CompletionStatus, PlayerShell, PlayerView};
use earnwatch_api::{ApiError, CompletionReporter, HttpTransport, LikeOutcome};
use earnwatch_core::{
    GuardConfig, MediaPlayer, MonitorEvent, MonitorState, PlaybackMonitor, ProgressStore,
    SeekDecision, SessionStorage, VideoId,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Something the user did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardCommand {
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Play if paused, pause if playing
    TogglePlay,
    /// Seek to an absolute position (progress bar click)
    SeekTo(f64),
    /// Forward button
    SkipForward,
    /// Rewind button
    SkipBackward,
    /// Like button
    Like,
    /// Share button
    Share,
    /// Leave the page; saves progress and stops
    Unmount,
}

/// Summary returned when a session ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    /// Identifies this session in logs
    pub session_id: Uuid,
    /// Video watched
    pub video_id: VideoId,
    /// Whether and how the completion was reported
    pub completion: CompletionStatus,
    /// High-water-mark at the end
    pub max_watched: f64,
    /// Tamper resets during the session
    pub resets: u32,
    /// Likes recorded
    pub likes: u64,
}

impl SessionReport {
    /// Video watched to the end
    #[inline]
    #[must_use]
    pub fn completed(&self) -> bool {
        self.completion != CompletionStatus::Watching
    }
}

#[derive(Debug)]
enum Background {
    Like(Result<LikeOutcome, ApiError>),
    Share(Result<ShareOutcome, ShareError>),
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Drives one watch session
pub struct WatchGuard<P, S, T> {
    session_id: Uuid,
    video_id: VideoId,
    player: P,
    monitor: PlaybackMonitor,
    store: ProgressStore<S>,
    reporter: Arc<CompletionReporter<T>>,
    shell: PlayerShell,
    share: Option<(ShareAction, SharePayload)>,
    views: watch::Sender<PlayerView>,
    ready: bool,
    resets: u32,
}

impl<P, S, T> std::fmt::Debug for WatchGuard<P, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGuard")
            .field("session_id", &self.session_id)
            .field("video_id", &self.video_id)
            .field("state", &self.monitor.state())
            .finish_non_exhaustive()
    }
}

impl<P, S, T> WatchGuard<P, S, T>
where
    P: MediaPlayer + Send + 'static,
    S: SessionStorage + 'static,
    T: HttpTransport + 'static,
{
    /// Mount a session, restoring persisted progress for `video_id`
    ///
    /// Returns the guard and a receiver that always holds the latest
    /// [`PlayerView`].
    pub fn new(
        video_id: VideoId,
        config: GuardConfig,
        player: P,
        store: ProgressStore<S>,
        reporter: Arc<CompletionReporter<T>>,
    ) -> (Self, watch::Receiver<PlayerView>) {
        let restored = store.load(&video_id);
        let mut shell = PlayerShell::new(video_id.clone(), &config);
        shell.set_likes(reporter.like_count());
        let monitor = PlaybackMonitor::new(video_id.clone(), config, restored);

        let initial = shell.view(&monitor, &player, now());
        let (views, rx) = watch::channel(initial);

        let guard = Self {
            session_id: Uuid::new_v4(),
            video_id,
            player,
            monitor,
            store,
            reporter,
            shell,
            share: None,
            views,
            ready: false,
            resets: 0,
        };
        (guard, rx)
    }

    /// Enable the share button
    #[must_use]
    pub fn with_share(mut self, action: ShareAction, payload: SharePayload) -> Self {
        self.share = Some((action, payload));
        self
    }

    /// Session identifier used in logs
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run until the video completes or `Unmount` arrives (or every
    /// command sender is dropped)
    pub async fn run(self, commands: mpsc::Receiver<GuardCommand>) -> SessionReport {
        let span = info_span!(
            "watch_session",
            session_id = %self.session_id,
            video_id = %self.video_id
        );
        self.run_inner(commands).instrument(span).await
    }

    async fn run_inner(mut self, mut commands: mpsc::Receiver<GuardCommand>) -> SessionReport {
        info!(
            max_watched = self.monitor.session().max_watched_time,
            "Watch session mounted"
        );
        self.try_ready();
        self.publish();

        let mut schedule = TaskSchedule::new(self.monitor.config());
        let (bg_tx, mut bg_rx) = mpsc::unbounded_channel();

        let completed = loop {
            tokio::select! {
                task = schedule.next() => self.run_task(task),
                command = commands.recv() => match command {
                    Some(GuardCommand::Unmount) | None => break false,
                    Some(command) => self.handle_command(command, &bg_tx),
                },
                Some(result) = bg_rx.recv() => self.on_background(result),
            }
            self.publish();
            if self.monitor.is_completed() {
                break true;
            }
        };
        drop(schedule);
        debug!("Periodic tasks stopped");

        if completed {
            self.report_completion().await;
        } else {
            self.save_progress();
            info!(
                max_watched = self.monitor.session().max_watched_time,
                "Watch session unmounted"
            );
        }

        SessionReport {
            session_id: self.session_id,
            video_id: self.video_id.clone(),
            completion: self.shell.completion().clone(),
            max_watched: self.monitor.session().max_watched_time,
            resets: self.resets,
            likes: self.reporter.like_count(),
        }
    }

    fn try_ready(&mut self) {
        if !self.ready && self.monitor.on_ready(&mut self.player) {
            self.ready = true;
            debug!(duration = self.monitor.session().duration, "Player ready");
        }
    }

    fn run_task(&mut self, task: ScheduledTask) {
        let now = now();
        self.try_ready();

        let event = match task {
            ScheduledTask::WatchTick => {
                let event = self.monitor.tick(&mut self.player, now);
                self.sync_playing(now);
                event
            }
            ScheduledTask::IntegrityCheck => self.monitor.check_integrity(&mut self.player, now),
            ScheduledTask::RateCheck => self.monitor.check_rate(&mut self.player, now),
            ScheduledTask::PersistSave => {
                self.save_progress();
                None
            }
        };
        if let Some(event) = event {
            self.on_event(event);
        }
    }

    /// Follow play/pause changes the player made on its own
    fn sync_playing(&mut self, now: Instant) {
        let playing = self.player.is_playing();
        match self.monitor.state() {
            MonitorState::Playing if !playing => self.monitor.on_pause(now),
            MonitorState::Idle | MonitorState::Paused if playing => {
                self.monitor.on_play(now);
            }
            MonitorState::Resetting | MonitorState::Completed if playing => self.player.pause(),
            _ => {}
        }
    }

    fn on_event(&mut self, event: MonitorEvent) {
        if let Some(notice) = Notice::for_event(&event) {
            self.shell.notify(notice);
        }
        if let MonitorEvent::Reset { reason } = event {
            self.resets += 1;
            info!(%reason, resets = self.resets, "Clearing persisted progress after reset");
            if let Err(e) = self.store.clear(&self.video_id) {
                warn!(error = %e, "Failed to clear persisted progress");
            }
        }
    }

    fn on_seek(&mut self, decision: SeekDecision) {
        match decision {
            SeekDecision::Reset(reason) => self.on_event(MonitorEvent::Reset { reason }),
            other => {
                debug!(?other, "Seek handled");
                if let Some(notice) = Notice::for_seek(&other) {
                    self.shell.notify(notice);
                }
            }
        }
    }

    fn handle_command(
        &mut self,
        command: GuardCommand,
        background: &mpsc::UnboundedSender<Background>,
    ) {
        let now = now();
        match command {
            GuardCommand::Play => self.play(now),
            GuardCommand::Pause => {
                self.player.pause();
                self.monitor.on_pause(now);
            }
            GuardCommand::TogglePlay => {
                if self.player.is_playing() {
                    self.handle_command(GuardCommand::Pause, background);
                } else {
                    self.play(now);
                }
            }
            GuardCommand::SeekTo(target) => {
                let decision = self.monitor.request_seek(&mut self.player, target, now);
                self.on_seek(decision);
            }
            GuardCommand::SkipForward | GuardCommand::SkipBackward => {
                let (kind, delta) = if command == GuardCommand::SkipForward {
                    (PopupKind::Forward, self.shell.skip_step())
                } else {
                    (PopupKind::Rewind, -self.shell.skip_step())
                };
                let decision = self.monitor.seek_by(&mut self.player, delta, now);
                if !matches!(decision, SeekDecision::Blocked) {
                    self.shell
                        .skip_pressed(kind, self.player.current_time(), now);
                }
                self.on_seek(decision);
            }
            GuardCommand::Like => self.like(background),
            GuardCommand::Share => self.share(background),
            GuardCommand::Unmount => {}
        }
    }

    fn play(&mut self, now: Instant) {
        self.try_ready();
        if !self.ready {
            self.shell.notify(Notice::info("Video is still loading"));
            return;
        }
        if self.monitor.on_play(now) {
            self.player.play();
        } else if self.monitor.state() == MonitorState::Resetting {
            self.shell
                .notify(Notice::info("Please wait, the player is resetting."));
        }
    }

    fn like(&mut self, background: &mpsc::UnboundedSender<Background>) {
        if self.reporter.is_like_pending() {
            debug!("Like already in flight");
            return;
        }
        self.shell.like_started();

        let reporter = Arc::clone(&self.reporter);
        let video_id = self.video_id.clone();
        let tx = background.clone();
        tokio::spawn(
            async move {
                let result = reporter.like(&video_id).await;
                let _ = tx.send(Background::Like(result));
            }
            .in_current_span(),
        );
    }

    fn share(&mut self, background: &mpsc::UnboundedSender<Background>) {
        let Some((action, payload)) = self.share.clone() else {
            self.shell.notify(Notice::info("Sharing is not available"));
            return;
        };
        let tx = background.clone();
        tokio::spawn(
            async move {
                let result = action.share(&payload).await;
                let _ = tx.send(Background::Share(result));
            }
            .in_current_span(),
        );
    }

    fn on_background(&mut self, result: Background) {
        match result {
            Background::Like(result) => self.shell.like_finished(&result),
            Background::Share(Ok(outcome)) => {
                if let Some(notice) = outcome.notice() {
                    self.shell.notify(notice);
                }
            }
            Background::Share(Err(e)) => {
                warn!(error = %e, "Share failed");
                self.shell.notify(Notice::error(e.to_string()));
            }
        }
    }

    fn save_progress(&self) {
        let session = self.monitor.session();
        // Nothing watched since mount or the last reset; keep the slot empty
        if session.max_watched_time <= 0.0 && session.current_time <= 0.0 {
            return;
        }
        match self.store.save(session) {
            Ok(true) => debug!(
                max_watched = self.monitor.session().max_watched_time,
                "Progress saved"
            ),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Progress save failed"),
        }
    }

    async fn report_completion(&mut self) {
        if let Err(e) = self.store.clear(&self.video_id) {
            warn!(error = %e, "Failed to clear persisted progress");
        }
        self.shell.completion_started();
        self.publish();

        let duration = self.monitor.session().duration;
        let result = self.reporter.mark_complete(&self.video_id, duration).await;
        match &result {
            Ok(outcome) => info!(?outcome, "Completion reported"),
            Err(e) => warn!(error = %e, "Completion could not be reported"),
        }
        self.shell.completion_finished(&result);
        self.publish();
    }

    fn publish(&mut self) {
        let view = self.shell.view(&self.monitor, &self.player, now());
        self.views.send_replace(view);
    }
}
