//! Completion Reporter
//!
//! The two backend actions a watch session performs:
//! - `like`: one authenticated GET, refreshed once on 401, never retried
//!   otherwise; concurrent calls collapse into one
//! - `mark_complete`: POST to the verification endpoint with a small
//!   retry budget; 401s refresh the token without spending it
//!
//! Both are idempotent from the caller's side.

use crate::auth::AuthClient;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::transport::{ApiRequest, HttpTransport};
use earnwatch_core::VideoId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of the verification POST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyVideoRequest {
    /// Video watched
    pub video_id: VideoId,
    /// Category tag
    pub video_type: String,
    /// Duration in seconds
    pub video_duration: f64,
    /// Always true when sent by the guard
    pub completed: bool,
}

/// Result of `like`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Like recorded; total likes in this session
    Liked {
        /// Likes recorded so far
        count: u64,
    },
    /// Another like is still in flight; nothing sent
    Pending,
}

/// Result of `mark_complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Backend accepted the completion
    Marked {
        /// Attempts that failed for non-auth reasons before success
        failed_attempts: u32,
        /// Token refreshes performed
        refreshes: u32,
    },
    /// Already marked earlier; nothing sent
    AlreadyMarked,
    /// Another call is in progress; nothing sent
    Pending,
}

/// Clears an in-flight flag on drop, including on cancellation
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reports likes and completion for videos
#[derive(Debug)]
pub struct CompletionReporter<T> {
    client: Arc<AuthClient<T>>,
    video_type: String,
    max_attempts: u32,
    max_refreshes: u32,
    likes: AtomicU64,
    like_in_flight: AtomicBool,
    complete_in_flight: AtomicBool,
    marked_complete: AtomicBool,
}

impl<T: HttpTransport> CompletionReporter<T> {
    /// Create reporter sharing an authenticated client
    #[must_use]
    pub fn new(client: Arc<AuthClient<T>>, config: &ApiConfig) -> Self {
        Self {
            client,
            video_type: config.video_type.clone(),
            max_attempts: config.max_complete_attempts.max(1),
            max_refreshes: config.max_auth_refreshes,
            likes: AtomicU64::new(0),
            like_in_flight: AtomicBool::new(false),
            complete_in_flight: AtomicBool::new(false),
            marked_complete: AtomicBool::new(false),
        }
    }

    /// Start the like counter at a known value
    #[must_use]
    pub fn with_initial_likes(self, likes: u64) -> Self {
        self.likes.store(likes, Ordering::Release);
        self
    }

    /// The shared client
    #[inline]
    #[must_use]
    pub fn client(&self) -> &Arc<AuthClient<T>> {
        &self.client
    }

    /// Likes recorded
    #[inline]
    #[must_use]
    pub fn like_count(&self) -> u64 {
        self.likes.load(Ordering::Acquire)
    }

    /// Whether a like is in flight
    #[inline]
    #[must_use]
    pub fn is_like_pending(&self) -> bool {
        self.like_in_flight.load(Ordering::Acquire)
    }

    /// Whether completion was accepted by the backend
    #[inline]
    #[must_use]
    pub fn is_marked_complete(&self) -> bool {
        self.marked_complete.load(Ordering::Acquire)
    }

    /// Like a video
    ///
    /// # Errors
    /// Any failure after the single refresh-and-retry; the caller shows
    /// it to the user.
    pub async fn like(&self, video_id: &VideoId) -> Result<LikeOutcome, ApiError> {
        let Some(_in_flight) = InFlight::acquire(&self.like_in_flight) else {
            return Ok(LikeOutcome::Pending);
        };

        let request = ApiRequest::get(["task", "like", video_id.as_str()]);
        match self.client.send_authenticated(request).await {
            Ok(_) => {
                let count = self.likes.fetch_add(1, Ordering::AcqRel) + 1;
                info!(%video_id, count, "Video liked");
                Ok(LikeOutcome::Liked { count })
            }
            Err(e) => {
                warn!(%video_id, error = %e, "Like failed");
                Err(e)
            }
        }
    }

    /// Report that a video was watched to the end
    ///
    /// Up to `max_complete_attempts` attempts with exponential backoff
    /// between them. A 401 refreshes the token and loops without spending
    /// an attempt (bounded by `max_auth_refreshes`). Failures that a retry
    /// cannot fix (4xx, undecodable bodies) are returned at once.
    ///
    /// # Errors
    /// - `ApiError::RefreshFailed` / `ApiError::Unauthorized` if auth
    ///   cannot be recovered
    /// - `ApiError::Status` for a non-retryable rejection
    /// - `ApiError::AttemptsExhausted` when every attempt failed
    pub async fn mark_complete(
        &self,
        video_id: &VideoId,
        duration: f64,
    ) -> Result<MarkOutcome, ApiError> {
        if self.is_marked_complete() {
            return Ok(MarkOutcome::AlreadyMarked);
        }
        let Some(_in_flight) = InFlight::acquire(&self.complete_in_flight) else {
            return Ok(MarkOutcome::Pending);
        };
        // A concurrent call may have finished between the two checks
        if self.is_marked_complete() {
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let body = VerifyVideoRequest {
            video_id: video_id.clone(),
            video_type: self.video_type.clone(),
            video_duration: duration,
            completed: true,
        };
        let body = serde_json::to_value(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let request = ApiRequest::post(["task", "verify", "video"], body);

        let mut failures = 0u32;
        let mut refreshes = 0u32;
        loop {
            let last = match self.client.send_once(request.clone()).await {
                Ok((response, _)) if response.is_success() => {
                    self.marked_complete.store(true, Ordering::Release);
                    info!(%video_id, failures, refreshes, "Completion verified");
                    return Ok(MarkOutcome::Marked {
                        failed_attempts: failures,
                        refreshes,
                    });
                }
                Ok((response, used)) if response.is_unauthorized() => {
                    if refreshes >= self.max_refreshes {
                        warn!(%video_id, refreshes, "Still unauthorized after refreshing");
                        return Err(ApiError::Unauthorized);
                    }
                    refreshes += 1;
                    self.client.refresh_after(used.as_deref()).await?;
                    continue;
                }
                Ok((response, _)) => response.into_status_error(),
                Err(e) => e,
            };

            if !last.is_retryable() {
                warn!(%video_id, error = %last, "Completion rejected");
                return Err(last);
            }

            failures += 1;
            warn!(
                %video_id,
                attempt = failures,
                max_attempts = self.max_attempts,
                error = %last,
                "Completion attempt failed"
            );
            if failures >= self.max_attempts {
                return Err(ApiError::AttemptsExhausted {
                    attempts: failures,
                    last: Box::new(last),
                });
            }
            tokio::time::sleep(self.client.config().backoff(failures)).await;
        }
    }
}
