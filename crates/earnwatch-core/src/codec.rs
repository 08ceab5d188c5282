//! Reversible obfuscation of persisted progress
//!
//! Byte shift followed by base64. This only keeps casual users from
//! editing their progress in storage; anyone with the source can reverse
//! it. It is not encryption and must not be relied on as such.

use crate::error::StoreError;
use crate::types::WatchSession;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const SHIFT: u8 = 7;

/// Shift every byte and base64-encode the result
#[must_use]
pub fn obfuscate(plain: &[u8]) -> String {
    let shifted: Vec<u8> = plain.iter().map(|b| b.wrapping_add(SHIFT)).collect();
    STANDARD.encode(shifted)
}

/// Inverse of [`obfuscate`]
///
/// # Errors
/// Returns `StoreError::Malformed` if the blob is not valid base64.
pub fn deobfuscate(blob: &str) -> Result<Vec<u8>, StoreError> {
    let shifted = STANDARD
        .decode(blob.trim())
        .map_err(|e| StoreError::Malformed(format!("base64: {e}")))?;
    Ok(shifted.into_iter().map(|b| b.wrapping_sub(SHIFT)).collect())
}

/// Serialize and obfuscate a session
///
/// # Errors
/// Returns `StoreError::Serialize` if JSON encoding fails.
pub fn encode_session(session: &WatchSession) -> Result<String, StoreError> {
    let json = serde_json::to_vec(session)?;
    Ok(obfuscate(&json))
}

/// Deobfuscate and parse a session
///
/// The result is not checked for consistency; that is the store's job.
///
/// # Errors
/// Returns `StoreError::Malformed` if the blob does not decode to a
/// session.
pub fn decode_session(blob: &str) -> Result<WatchSession, StoreError> {
    let json = deobfuscate(blob)?;
    serde_json::from_slice(&json).map_err(|e| StoreError::Malformed(format!("json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoId;

    #[test]
    fn obfuscated_blob_hides_plain_json() {
        let session = WatchSession::new(VideoId::new("vid-42"))
            .with_duration(100.0)
            .with_progress(30.0, 45.0);
        let blob = encode_session(&session).unwrap();

        assert!(!blob.contains("maxWatchedTime"));
        assert_eq!(decode_session(&blob).unwrap(), session);
    }

    #[test]
    fn non_ascii_ids_survive() {
        let session = WatchSession::new(VideoId::new("видео-✓")).with_duration(10.0);
        let blob = encode_session(&session).unwrap();
        assert_eq!(decode_session(&blob).unwrap().video_id.as_str(), "видео-✓");
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode_session("%%% not base64 %%%"),
            Err(StoreError::Malformed(_))
        ));

        // Valid base64, but not a shifted session
        let blob = STANDARD.encode(b"{\"hello\":1}");
        assert!(matches!(decode_session(&blob), Err(StoreError::Malformed(_))));
    }
}
