//! Testing utilities for the Earnwatch workspace
//!
//! Shared fakes:
//! - `ScriptedTransport`: canned HTTP responses per path, records requests
//! - `ManualPlayer`: a media player that only moves when told to
//! - `RecordingClipboard` / `ScriptedShare`: share action collaborators

#![allow(missing_docs)]

use async_trait::async_trait;
use earnwatch_api::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};
use earnwatch_core::MediaPlayer;
use earnwatch_player::{Clipboard, NativeShare, ShareError, SharePayload};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub const LIKE_PATH_PREFIX: &str = "/task/like/";
pub const VERIFY_PATH: &str = "/task/verify/video";
pub const REFRESH_PATH: &str = "/refresh/token";

type Scripted = Result<ApiResponse, TransportError>;

/// A request as the transport saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub with_credentials: bool,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<String, VecDeque<Scripted>>,
    fallback: HashMap<String, Scripted>,
}

/// Transport answering from a script
///
/// Each path has a queue of responses consumed in order; when the queue
/// is empty the path's fallback (set with `always`) answers, and paths
/// with neither get a 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next request to `path` with `status` and `body`
    pub fn push(&self, path: &str, status: u16, body: Value) -> &Self {
        self.push_result(path, Ok(ApiResponse::new(status, body)))
    }

    /// Fail the next request to `path` at the transport level
    pub fn push_error(&self, path: &str, error: TransportError) -> &Self {
        self.push_result(path, Err(error))
    }

    /// Answer every unscripted request to `path`
    pub fn always(&self, path: &str, status: u16, body: Value) -> &Self {
        self.script
            .lock()
            .fallback
            .insert(path.to_string(), Ok(ApiResponse::new(status, body)));
        self
    }

    /// Script a successful refresh returning `token`
    pub fn refresh_ok(&self, token: &str) -> &Self {
        self.push(REFRESH_PATH, 200, json!({ "accessToken": token }))
    }

    /// Sleep this long before every response
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    fn push_result(&self, path: &str, result: Scripted) -> &Self {
        self.script
            .lock()
            .queued
            .entry(path.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Every request seen, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Requests seen for one path
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests seen for one path
    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = request.path();
        self.requests.lock().push(RecordedRequest {
            method: request.method,
            path: path.clone(),
            bearer: request.bearer.clone(),
            with_credentials: request.with_credentials,
            body: request.body.clone(),
        });

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock();
        if let Some(next) = script.queued.get_mut(&path).and_then(VecDeque::pop_front) {
            return next;
        }
        script
            .fallback
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Ok(ApiResponse::new(404, json!({ "message": "not scripted" }))))
    }
}

/// Player that only moves when the test says so
#[derive(Debug, Clone)]
pub struct ManualPlayer {
    pub position: f64,
    pub duration: Option<f64>,
    pub rate: f64,
    pub playing: bool,
    /// Every `seek_to` issued by the code under test
    pub seeks: Vec<f64>,
}

impl ManualPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            duration: Some(duration),
            rate: 1.0,
            playing: false,
            seeks: Vec::new(),
        }
    }

    /// Advance the playhead as if `secs` of playback happened
    pub fn advance(&mut self, secs: f64) {
        self.position += secs * self.rate;
        if let Some(d) = self.duration {
            self.position = self.position.min(d);
        }
    }
}

impl MediaPlayer for ManualPlayer {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek_to(&mut self, position: f64) {
        self.seeks.push(position);
        self.position = position;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }
}

/// Clipboard that remembers what was written
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    written: Mutex<Vec<String>>,
    broken: bool,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard whose writes always fail
    pub fn broken() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            broken: true,
        }
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().clone()
    }
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ShareError> {
        if self.broken {
            return Err(ShareError::Clipboard("permission denied".to_string()));
        }
        self.written.lock().push(text.to_string());
        Ok(())
    }
}

/// Native share returning a fixed result
#[derive(Debug)]
pub struct ScriptedShare {
    result: Result<(), ShareError>,
    shared: Mutex<Vec<SharePayload>>,
}

impl ScriptedShare {
    pub fn succeeding() -> Self {
        Self::returning(Ok(()))
    }

    pub fn failing(error: ShareError) -> Self {
        Self::returning(Err(error))
    }

    fn returning(result: Result<(), ShareError>) -> Self {
        Self {
            result,
            shared: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.shared.lock().len()
    }
}

#[async_trait]
impl NativeShare for ScriptedShare {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        self.shared.lock().push(payload.clone());
        self.result.clone()
    }
}

/// Path of the like endpoint for a video
pub fn like_path(video_id: &str) -> String {
    format!("{LIKE_PATH_PREFIX}{video_id}")
}
