//! User-visible notices
//!
//! Non-blocking messages (the toasts of a web player). Monitor events,
//! reporter outcomes and share results all end up here; the board keeps
//! the most recent few for rendering.

use chrono::{DateTime, Utc};
use earnwatch_core::{MonitorEvent, SeekDecision};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Notices kept by default
pub const DEFAULT_NOTICE_CAPACITY: usize = 5;

/// Severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Neutral information
    Info,
    /// Something went right
    Success,
    /// Recoverable problem
    Warning,
    /// Action failed
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Success => "ok",
            Self::Warning => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text
    pub message: String,
    /// When it was raised
    pub at: DateTime<Utc>,
}

impl Notice {
    /// Create a notice stamped now
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Info notice
    #[inline]
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    /// Success notice
    #[inline]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    /// Warning notice
    #[inline]
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    /// Error notice
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// What the user should see for a monitor event, if anything
    #[must_use]
    pub fn for_event(event: &MonitorEvent) -> Option<Self> {
        match event {
            MonitorEvent::Progress { .. } => None,
            MonitorEvent::SkipRejected { remaining, .. } => Some(Self::warning(format!(
                "You can't skip ahead. {remaining} more attempt(s) will reset your progress."
            ))),
            MonitorEvent::RateCorrected { remaining, .. } => Some(Self::warning(format!(
                "Playback speed is locked to 1x. {remaining} more change(s) will reset your progress."
            ))),
            MonitorEvent::Reset { reason } => Some(Self::error(format!(
                "Progress reset after {reason}. Playback resumes shortly."
            ))),
            MonitorEvent::CooldownFinished => Some(Self::info("You can resume watching.")),
            MonitorEvent::Completed { .. } => Some(Self::success("Video completed!")),
        }
    }

    /// What the user should see for a seek decision, if anything
    #[must_use]
    pub fn for_seek(decision: &SeekDecision) -> Option<Self> {
        match decision {
            SeekDecision::Allowed { .. } | SeekDecision::Clamped { .. } => None,
            SeekDecision::Rejected { .. } => {
                Some(Self::warning("You can only skip within what you have watched."))
            }
            SeekDecision::Reset(reason) => Some(Self::error(format!(
                "Progress reset after {reason}. Playback resumes shortly."
            ))),
            SeekDecision::Blocked => Some(Self::info("Please wait, the player is resetting.")),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Most recent notices, oldest first
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    capacity: usize,
    notices: VecDeque<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_CAPACITY)
    }
}

impl NoticeBoard {
    /// Board holding up to `capacity` notices
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            notices: VecDeque::with_capacity(capacity),
        }
    }

    /// Add a notice, evicting the oldest when full
    pub fn push(&mut self, notice: Notice) {
        if self.notices.len() == self.capacity {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Newest notice
    #[must_use]
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// All kept notices
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Number kept
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Nothing kept
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
