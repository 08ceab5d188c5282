//! Error types for the player shell

/// Share action errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareError {
    /// No native share facility on this platform
    #[error("native share unavailable")]
    Unavailable,

    /// The user dismissed the share sheet
    #[error("share cancelled")]
    Cancelled,

    /// Native share failed
    #[error("share failed: {0}")]
    Failed(String),

    /// Writing to the clipboard failed
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

impl ShareError {
    /// User backed out; nothing to report
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the clipboard fallback should be tried
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Failed(_))
    }
}
