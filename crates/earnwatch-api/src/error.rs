//! Error types for backend calls
//!
//! Classifies failures the way the UI reacts to them:
//! - transport problems: warn and let the user try again
//! - auth expiry: refreshed transparently, surfaced only if refresh fails
//! - other HTTP statuses: user-visible error

/// Network-level failure (no HTTP status was received)
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Could not connect or the connection dropped
    #[error("connection failed: {0}")]
    Connect(String),

    /// Request could not be built or sent
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Main API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network failure
    #[error("network error: {0}")]
    Transport(#[from] TransportError),

    /// Still unauthorized after refreshing the token
    #[error("session expired, please log in again")]
    Unauthorized,

    /// Refresh endpoint rejected the request or returned no token
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// Backend answered with a non-success status
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the body, if any
        message: String,
    },

    /// Body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Every attempt failed
    #[error("gave up after {attempts} attempts: {last}")]
    AttemptsExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<ApiError>,
    },
}

impl ApiError {
    /// Check if error is an authentication failure
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::RefreshFailed(_))
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }

    /// Short text suitable for a toast
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Network problem, please try again".to_string(),
            Self::Unauthorized | Self::RefreshFailed(_) => {
                "Your session expired, please log in again".to_string()
            }
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::AttemptsExhausted { last, .. } => last.user_message(),
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}
