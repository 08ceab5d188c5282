//! Authenticated requests with one-shot token refresh
//!
//! Every authenticated call in the app follows the same pattern: send
//! with the current bearer token; on 401 exchange the refresh cookie for a
//! new token and retry once. This module is the only place that pattern
//! lives.

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::token::{extract_access_token, TokenStore};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Path of the token refresh endpoint
pub const REFRESH_PATH: [&str; 2] = ["refresh", "token"];

/// Client that attaches and refreshes bearer tokens
#[derive(Debug)]
pub struct AuthClient<T> {
    transport: T,
    tokens: TokenStore,
    config: ApiConfig,
    /// Serialises refreshes so concurrent 401s cause one refresh
    refresh_lock: Mutex<()>,
}

impl<T: HttpTransport> AuthClient<T> {
    /// Create client over a transport
    #[must_use]
    pub fn new(transport: T, config: ApiConfig) -> Self {
        Self {
            transport,
            tokens: TokenStore::new(),
            config,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Token store
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Underlying transport
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send once with the current token, whatever the status
    ///
    /// Returns the response and the token that was used, so a caller
    /// seeing 401 can ask for a refresh of exactly that token.
    ///
    /// # Errors
    /// Returns `ApiError::Transport` if nothing was received.
    pub async fn send_once(
        &self,
        request: ApiRequest,
    ) -> Result<(ApiResponse, Option<String>), ApiError> {
        let token = self.tokens.get();
        let path = request.path();
        let response = self.transport.send(request.with_bearer(token.clone())).await?;
        debug!(%path, status = response.status, "Authenticated request sent");
        Ok((response, token))
    }

    /// Exchange the refresh cookie for a new access token
    ///
    /// `stale` is the token that was rejected. If another task already
    /// replaced it, that newer token is returned without a second refresh.
    ///
    /// # Errors
    /// - `ApiError::RefreshFailed` if the endpoint rejects the request or
    ///   returns no token
    /// - `ApiError::Transport` on network failure
    pub async fn refresh_after(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.get() {
            if Some(current.as_str()) != stale {
                debug!("Token already refreshed by another request");
                return Ok(current);
            }
        }

        let request = ApiRequest::get(REFRESH_PATH).with_credentials();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Token refresh rejected");
            return Err(ApiError::RefreshFailed(format!(
                "status {}",
                response.status
            )));
        }

        let token = extract_access_token(&response.body).ok_or_else(|| {
            warn!("Token refresh returned no access token");
            ApiError::RefreshFailed("no access token in response".to_string())
        })?;
        self.tokens.set(token.clone());
        info!("Access token refreshed");
        Ok(token)
    }

    /// Send with refresh-and-retry
    ///
    /// On 401 the token is refreshed once and the request retried once.
    /// A second 401 is `ApiError::Unauthorized`; any other non-success
    /// status is `ApiError::Status`. No other retries happen here.
    ///
    /// # Errors
    /// See above; transport failures are returned as-is.
    pub async fn send_authenticated(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let (response, used) = self.send_once(request.clone()).await?;

        let response = if response.is_unauthorized() {
            debug!(path = %request.path(), "401, refreshing token");
            self.refresh_after(used.as_deref()).await?;
            let (retried, _) = self.send_once(request).await?;
            if retried.is_unauthorized() {
                return Err(ApiError::Unauthorized);
            }
            retried
        } else {
            response
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(response.into_status_error())
        }
    }

    /// GET and decode JSON (dashboard, profile and similar reads)
    ///
    /// # Errors
    /// As [`AuthClient::send_authenticated`], plus `ApiError::Decode`.
    pub async fn get_json<R, I, S>(&self, segments: I) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send_authenticated(ApiRequest::get(segments))
            .await?
            .json()
    }
}
