//! Progress store
//!
//! Best-effort persistence of a `WatchSession` per video. Loading never
//! fails: anything unreadable or inconsistent is discarded and the
//! session starts from zero.

use crate::codec::{decode_session, encode_session};
use crate::error::StoreError;
use crate::storage::SessionStorage;
use crate::types::{VideoId, WatchSession};
use tracing::{debug, warn};

/// Storage key prefix for persisted sessions
pub const KEY_PREFIX: &str = "video_progress_";

/// Storage key for a video
#[inline]
#[must_use]
pub fn storage_key(video_id: &VideoId) -> String {
    format!("{KEY_PREFIX}{video_id}")
}

/// Obfuscated per-video progress persistence
#[derive(Debug)]
pub struct ProgressStore<S> {
    storage: S,
}

impl<S: SessionStorage> ProgressStore<S> {
    /// Create store over a storage backend
    #[inline]
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Borrow the backend
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load persisted progress for a video
    ///
    /// Returns `None` when nothing is stored, the blob is malformed, the
    /// session belongs to another video, or the session is corrupt
    /// (`max_watched_time > duration`). Discarded blobs are removed.
    pub fn load(&self, video_id: &VideoId) -> Option<WatchSession> {
        match self.try_load(video_id) {
            Ok(session) => session,
            Err(e) if e.is_discardable() => {
                warn!(%video_id, error = %e, "Discarding persisted progress");
                if let Err(e) = self.clear(video_id) {
                    warn!(%video_id, error = %e, "Failed to remove discarded progress");
                }
                None
            }
            Err(e) => {
                warn!(%video_id, error = %e, "Failed to read persisted progress");
                None
            }
        }
    }

    /// Load with the reason for rejection
    ///
    /// # Errors
    /// - `StoreError::Io` if the backend fails
    /// - `StoreError::Malformed` if the blob does not decode or names
    ///   another video
    /// - `StoreError::Corrupt` if the session violates its invariants
    pub fn try_load(&self, video_id: &VideoId) -> Result<Option<WatchSession>, StoreError> {
        let Some(blob) = self.storage.get(&storage_key(video_id))? else {
            return Ok(None);
        };

        let session = decode_session(&blob)?;
        if session.video_id != *video_id {
            return Err(StoreError::Malformed(format!(
                "stored session belongs to {}",
                session.video_id
            )));
        }
        if !session.is_consistent() {
            return Err(StoreError::Corrupt {
                max_watched: session.max_watched_time,
                duration: session.duration,
            });
        }

        debug!(
            %video_id,
            current = session.current_time,
            max_watched = session.max_watched_time,
            "Loaded persisted progress"
        );
        Ok(Some(session))
    }

    /// Persist a session
    ///
    /// Completed sessions are never written. Returns whether a write
    /// happened.
    ///
    /// # Errors
    /// Returns `StoreError` if encoding or the backend fails.
    pub fn save(&self, session: &WatchSession) -> Result<bool, StoreError> {
        if session.completed {
            return Ok(false);
        }
        let blob = encode_session(session)?;
        self.storage.set(&storage_key(&session.video_id), &blob)?;
        debug!(
            video_id = %session.video_id,
            max_watched = session.max_watched_time,
            "Saved progress"
        );
        Ok(true)
    }

    /// Remove persisted progress
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the backend fails.
    pub fn clear(&self, video_id: &VideoId) -> Result<(), StoreError> {
        self.storage.remove(&storage_key(video_id))?;
        debug!(%video_id, "Cleared progress");
        Ok(())
    }
}
