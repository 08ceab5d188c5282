//! Access token storage

use parking_lot::RwLock;
use serde_json::Value;

/// Current bearer token, shared by every request
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<Option<String>>,
}

impl TokenStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner.read().clone()
    }

    /// Replace the token
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    /// Forget the token
    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

/// Pull the access token out of a refresh response
///
/// Accepts `{"accessToken": "..."}` and `{"data": {"accessToken": "..."}}`.
#[must_use]
pub fn extract_access_token(body: &Value) -> Option<String> {
    body.get("accessToken")
        .or_else(|| body.get("data").and_then(|d| d.get("accessToken")))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
