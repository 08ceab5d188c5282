//! Share action
//!
//! Native share first; if the platform has none or it fails, copy the
//! link to the clipboard instead. A user cancelling the share sheet is
//! not a failure and does not fall back.

use crate::error::ShareError;
use crate::notice::Notice;
use earnwatch_core::VideoId;
use std::sync::Arc;
use tracing::{debug, warn};

/// What gets shared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    /// Title line
    pub title: String,
    /// Short message
    pub text: String,
    /// Link to the video
    pub url: String,
}

impl SharePayload {
    /// Payload for a video page
    #[must_use]
    pub fn for_video(video_id: &VideoId, url: impl Into<String>) -> Self {
        Self {
            title: format!("Video {video_id}"),
            text: "Watch this video and earn rewards".to_string(),
            url: url.into(),
        }
    }
}

/// Platform share sheet
#[async_trait::async_trait]
pub trait NativeShare: Send + Sync {
    /// Offer the payload to the user
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// System clipboard
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents
    async fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

/// Clipboard stand-in for terminals: prints the link
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalClipboard;

#[async_trait::async_trait]
impl Clipboard for TerminalClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ShareError> {
        println!("Share link: {text}");
        Ok(())
    }
}

/// How a share ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Native share completed
    Shared,
    /// Link copied to the clipboard
    Copied,
    /// User dismissed the share sheet
    Cancelled,
}

impl ShareOutcome {
    /// Notice to show, if any
    #[must_use]
    pub fn notice(self) -> Option<Notice> {
        match self {
            Self::Shared => Some(Notice::success("Shared!")),
            Self::Copied => Some(Notice::success("Link copied to clipboard")),
            Self::Cancelled => None,
        }
    }
}

/// Share with clipboard fallback
#[derive(Clone)]
pub struct ShareAction {
    native: Option<Arc<dyn NativeShare>>,
    clipboard: Arc<dyn Clipboard>,
}

impl std::fmt::Debug for ShareAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareAction")
            .field("native", &self.native.is_some())
            .finish_non_exhaustive()
    }
}

impl ShareAction {
    /// Clipboard-only share
    #[must_use]
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            native: None,
            clipboard,
        }
    }

    /// With a native share sheet
    #[inline]
    #[must_use]
    pub fn with_native(mut self, native: Arc<dyn NativeShare>) -> Self {
        self.native = Some(native);
        self
    }

    /// Share the payload
    ///
    /// # Errors
    /// Returns `ShareError::Clipboard` when native share was unusable and
    /// the clipboard fallback failed too, or when the native sheet itself
    /// reported a clipboard failure.
    pub async fn share(&self, payload: &SharePayload) -> Result<ShareOutcome, ShareError> {
        if let Some(native) = &self.native {
            match native.share(payload).await {
                Ok(()) => return Ok(ShareOutcome::Shared),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "Native share failed, copying link instead");
                }
                Err(e) if e.is_cancelled() => {
                    debug!("Share cancelled by user");
                    return Ok(ShareOutcome::Cancelled);
                }
                Err(e) => return Err(e),
            }
        }

        self.clipboard
            .write_text(&payload.url)
            .await
            .map_err(|e| match e {
                ShareError::Clipboard(_) => e,
                other => ShareError::Clipboard(other.to_string()),
            })?;
        Ok(ShareOutcome::Copied)
    }
}
