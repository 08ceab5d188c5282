//! Player Shell
//!
//! Presentation state around one playback monitor:
//! - play/pause toggle and the rewind/forward buttons
//! - a two-layer progress bar (current position, high-water-mark)
//! - like counter, skip popups, notices and the completion banner
//!
//! The shell never decides whether a seek or a rate change is allowed;
//! it asks the monitor and renders what happened. `view()` produces a
//! plain `PlayerView` snapshot; `render_text` draws it for terminals.

use crate::notice::{Notice, NoticeBoard};
use crate::popup::{PopupEvent, PopupKind, PopupQueue};
use earnwatch_api::{ApiError, LikeOutcome, MarkOutcome};
use earnwatch_core::{GuardConfig, MediaPlayer, MonitorState, PlaybackMonitor, VideoId};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;

const BAR_WIDTH: usize = 40;

/// Label of the play/pause toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayButton {
    /// Player paused; button starts playback
    Play,
    /// Player running; button pauses
    Pause,
}

/// Where completion reporting stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum CompletionStatus {
    /// Not at the end yet
    Watching,
    /// Reached the end; reporting to the backend
    Verifying,
    /// Backend accepted the completion
    Verified,
    /// Reporting failed; the message says why
    Failed(String),
}

/// Snapshot of everything on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    /// Video shown
    pub video_id: VideoId,
    /// Monitor state
    pub state: MonitorState,
    /// Toggle label
    pub play_button: PlayButton,
    /// Rewind is always available
    pub rewind_enabled: bool,
    /// Forward only inside watched territory
    pub forward_enabled: bool,
    /// Playhead in seconds
    pub position: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Solid part of the progress bar
    pub watched_fraction: f64,
    /// Translucent part of the progress bar
    pub max_reached_fraction: f64,
    /// Likes recorded
    pub likes: u64,
    /// A like is in flight; the button is disabled
    pub like_pending: bool,
    /// Completion reporting
    pub completion: CompletionStatus,
    /// Popups on screen
    pub popups: Vec<PopupEvent>,
    /// Recent notices, oldest first
    pub notices: Vec<Notice>,
}

impl PlayerView {
    /// Banner shown once the video is finished
    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        match &self.completion {
            CompletionStatus::Watching => None,
            CompletionStatus::Verifying => Some("Video completed! Verifying..."),
            CompletionStatus::Verified => Some("Video completed! Reward verified."),
            CompletionStatus::Failed(_) => Some("Video completed, but verification failed."),
        }
    }
}

/// Presentation state for one video
#[derive(Debug)]
pub struct PlayerShell {
    video_id: VideoId,
    skip_step_secs: f64,
    popups: PopupQueue,
    notices: NoticeBoard,
    likes: u64,
    like_pending: bool,
    completion: CompletionStatus,
}

impl PlayerShell {
    /// Shell for `video_id` with popup lifetime and skip step from config
    #[must_use]
    pub fn new(video_id: VideoId, config: &GuardConfig) -> Self {
        Self {
            video_id,
            skip_step_secs: config.skip_step_secs,
            popups: PopupQueue::new(config.popup_ttl()),
            notices: NoticeBoard::default(),
            likes: 0,
            like_pending: false,
            completion: CompletionStatus::Watching,
        }
    }

    /// Seconds moved by one skip button press
    #[inline]
    #[must_use]
    pub fn skip_step(&self) -> f64 {
        self.skip_step_secs
    }

    /// Show a notice
    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Notices kept
    #[must_use]
    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// A skip button was pressed; `position` is the playhead afterwards
    pub fn skip_pressed(&mut self, kind: PopupKind, position: f64, now: Instant) {
        self.popups.push(kind, position, now);
    }

    /// Current like count (e.g. from the backend on load)
    pub fn set_likes(&mut self, likes: u64) {
        self.likes = likes;
    }

    /// A like request was sent
    pub fn like_started(&mut self) {
        self.like_pending = true;
    }

    /// A like request finished
    pub fn like_finished(&mut self, result: &Result<LikeOutcome, ApiError>) {
        match result {
            Ok(LikeOutcome::Liked { count }) => {
                self.like_pending = false;
                self.likes = *count;
                self.notify(Notice::success("Thanks for the like!"));
            }
            // Another request owns the flag and will clear it
            Ok(LikeOutcome::Pending) => {}
            Err(e) => {
                self.like_pending = false;
                self.notify(Notice::error(e.user_message()));
            }
        }
    }

    /// The video reached its end; reporting starts
    pub fn completion_started(&mut self) {
        self.completion = CompletionStatus::Verifying;
    }

    /// Completion reporting finished
    pub fn completion_finished(&mut self, result: &Result<MarkOutcome, ApiError>) {
        match result {
            Ok(MarkOutcome::Marked { .. } | MarkOutcome::AlreadyMarked) => {
                self.completion = CompletionStatus::Verified;
                self.notify(Notice::success("Reward verified"));
            }
            Ok(MarkOutcome::Pending) => {}
            Err(e) => {
                let message = e.user_message();
                self.notify(Notice::warning(message.clone()));
                self.completion = CompletionStatus::Failed(message);
            }
        }
    }

    /// Completion status
    #[must_use]
    pub fn completion(&self) -> &CompletionStatus {
        &self.completion
    }

    /// Snapshot for rendering
    pub fn view<P: MediaPlayer + ?Sized>(
        &mut self,
        monitor: &PlaybackMonitor,
        player: &P,
        now: Instant,
    ) -> PlayerView {
        self.popups.expire(now);

        let session = monitor.session();
        let state = monitor.state();
        let position = match state {
            MonitorState::Completed => session.duration,
            _ => player.current_time(),
        };
        let duration = player
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(session.duration);
        let fraction = |value: f64| {
            if duration > 0.0 {
                (value / duration).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        PlayerView {
            video_id: self.video_id.clone(),
            state,
            play_button: if player.is_playing() {
                PlayButton::Pause
            } else {
                PlayButton::Play
            },
            rewind_enabled: true,
            forward_enabled: match state {
                MonitorState::Completed => position < duration,
                MonitorState::Resetting => false,
                _ => monitor.can_skip_forward(position),
            },
            position,
            duration,
            watched_fraction: fraction(position),
            max_reached_fraction: session.max_reached_fraction(),
            likes: self.likes,
            like_pending: self.like_pending,
            completion: self.completion.clone(),
            popups: self.popups.active(now),
            notices: self.notices.iter().cloned().collect(),
        }
    }
}

/// `mm:ss`, or `h:mm:ss` past an hour
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Progress bar: `#` watched, `-` reached earlier, `.` not reached
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn render_bar(watched: f64, reached: f64, width: usize) -> String {
    let cells = |f: f64| ((f.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let watched = cells(watched);
    let reached = cells(reached).max(watched);
    let mut bar = String::with_capacity(width);
    bar.extend(std::iter::repeat('#').take(watched));
    bar.extend(std::iter::repeat('-').take(reached - watched));
    bar.extend(std::iter::repeat('.').take(width - reached));
    bar
}

/// Draw a view as a few lines of text
#[must_use]
pub fn render_text(view: &PlayerView, skip_step_secs: f64) -> String {
    let mut out = String::new();

    let toggle = match view.play_button {
        PlayButton::Play => "[>]",
        PlayButton::Pause => "[||]",
    };
    let rewind = if view.rewind_enabled { "[<<]" } else { "[  ]" };
    let forward = if view.forward_enabled { "[>>]" } else { "[  ]" };
    let like = if view.like_pending { "[like...]" } else { "[like]" };

    let _ = writeln!(
        out,
        "{rewind} {toggle} {forward}  {} / {}  [{}]  {like} {}",
        format_clock(view.position),
        format_clock(view.duration),
        render_bar(view.watched_fraction, view.max_reached_fraction, BAR_WIDTH),
        view.likes,
    );

    for popup in &view.popups {
        let _ = writeln!(
            out,
            "  {} ({})",
            popup.label(skip_step_secs),
            format_clock(popup.position)
        );
    }
    if view.state == MonitorState::Resetting {
        let _ = writeln!(out, "  resetting...");
    }
    if let Some(banner) = view.banner() {
        let _ = writeln!(out, "  {banner}");
    }
    if let Some(notice) = view.notices.last() {
        let _ = writeln!(out, "  {notice}");
    }
    out
}
