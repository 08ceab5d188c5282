//! Native share with clipboard fallback

use earnwatch_core::VideoId;
use earnwatch_player::{ShareAction, ShareError, ShareOutcome, SharePayload};
use earnwatch_test_utils::{RecordingClipboard, ScriptedShare};
use std::sync::Arc;

const URL: &str = "https://example.com/watch/v1";

fn payload() -> SharePayload {
    SharePayload::for_video(&VideoId::new("v1"), URL)
}

#[tokio::test]
async fn native_share_wins_when_it_works() {
    let native = Arc::new(ScriptedShare::succeeding());
    let clipboard = Arc::new(RecordingClipboard::new());
    let action = ShareAction::new(clipboard.clone()).with_native(native.clone());

    let outcome = action.share(&payload()).await.unwrap();

    assert_eq!(outcome, ShareOutcome::Shared);
    assert_eq!(native.calls(), 1);
    assert!(clipboard.written().is_empty());
}

#[tokio::test]
async fn cancelled_share_does_not_fall_back() {
    let native = Arc::new(ScriptedShare::failing(ShareError::Cancelled));
    let clipboard = Arc::new(RecordingClipboard::new());
    let action = ShareAction::new(clipboard.clone()).with_native(native);

    let outcome = action.share(&payload()).await.unwrap();

    assert_eq!(outcome, ShareOutcome::Cancelled);
    assert!(outcome.notice().is_none());
    assert!(clipboard.written().is_empty());
}

#[tokio::test]
async fn failed_native_share_copies_link() {
    for error in [ShareError::Unavailable, ShareError::Failed("sheet crashed".to_string())] {
        let clipboard = Arc::new(RecordingClipboard::new());
        let action = ShareAction::new(clipboard.clone())
            .with_native(Arc::new(ScriptedShare::failing(error)));

        let outcome = action.share(&payload()).await.unwrap();

        assert_eq!(outcome, ShareOutcome::Copied);
        assert_eq!(clipboard.written(), vec![URL.to_string()]);
    }
}

#[tokio::test]
async fn clipboard_only_when_no_native_share() {
    let clipboard = Arc::new(RecordingClipboard::new());
    let action = ShareAction::new(clipboard.clone());

    assert_eq!(action.share(&payload()).await.unwrap(), ShareOutcome::Copied);
    assert_eq!(clipboard.written(), vec![URL.to_string()]);
}

#[tokio::test]
async fn broken_clipboard_is_an_error() {
    let action = ShareAction::new(Arc::new(RecordingClipboard::broken()))
        .with_native(Arc::new(ScriptedShare::failing(ShareError::Unavailable)));

    let err = action.share(&payload()).await.unwrap_err();
    assert!(matches!(err, ShareError::Clipboard(_)));
}

#[tokio::test]
async fn native_clipboard_failure_skips_fallback() {
    let clipboard = Arc::new(RecordingClipboard::new());
    let action = ShareAction::new(clipboard.clone()).with_native(Arc::new(
        ScriptedShare::failing(ShareError::Clipboard("denied".to_string())),
    ));

    let err = action.share(&payload()).await.unwrap_err();

    assert_eq!(err, ShareError::Clipboard("denied".to_string()));
    assert!(clipboard.written().is_empty());
}
