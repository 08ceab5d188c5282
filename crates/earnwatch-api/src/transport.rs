//! HTTP transport seam
//!
//! Requests are described as plain data so the authenticated client and
//! reporter can be driven by a scripted transport in tests. The
//! production transport is reqwest with a cookie jar that is only sent
//! on credentialed requests (the token refresh).

use crate::config::ApiConfig;
use crate::error::{ApiError, TransportError};
use reqwest::cookie::Jar;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// Transport-independent request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Method
    pub method: Method,
    /// Path segments below the base URL (unencoded)
    pub segments: Vec<String>,
    /// Bearer token
    pub bearer: Option<String>,
    /// JSON body
    pub body: Option<Value>,
    /// Send cookies
    pub with_credentials: bool,
}

impl ApiRequest {
    /// GET request
    #[must_use]
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: Method::Get,
            segments: segments.into_iter().map(Into::into).collect(),
            bearer: None,
            body: None,
            with_credentials: false,
        }
    }

    /// POST request with JSON body
    #[must_use]
    pub fn post<I, S>(segments: I, body: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: Method::Post,
            body: Some(body),
            ..Self::get(segments)
        }
    }

    /// With bearer token (or none)
    #[inline]
    #[must_use]
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// Include cookies
    #[inline]
    #[must_use]
    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }

    /// Path for logs, e.g. `/task/like/abc`
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Transport-independent response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status
    pub status: u16,
    /// Parsed body; `Null` when empty, a string when not JSON
    pub body: Value,
}

impl ApiResponse {
    /// Create response
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Backend-provided message, if any
    #[must_use]
    pub fn message(&self) -> String {
        match &self.body {
            Value::String(s) => s.clone(),
            body => body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Decode the body
    ///
    /// # Errors
    /// Returns `ApiError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.body.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Convert a non-success response into an error
    #[must_use]
    pub fn into_status_error(self) -> ApiError {
        ApiError::Status {
            status: self.status,
            message: self.message(),
        }
    }
}

/// Sends requests to the backend
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request; any HTTP status is a successful send
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait::async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base: Url,
    jar: Arc<Jar>,
    credentialed: Client,
    plain: Client,
}

impl ReqwestTransport {
    /// Build clients for the configured backend
    ///
    /// # Errors
    /// Returns `TransportError::Request` if the base URL is invalid or the
    /// TLS backend cannot be initialised.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| TransportError::Request(format!("invalid base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::Request(format!(
                "base URL cannot carry a path: {base}"
            )));
        }

        let jar = Arc::new(Jar::default());
        let credentialed = Client::builder()
            .timeout(config.timeout())
            .cookie_provider(jar.clone())
            .build()?;
        let plain = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base,
            jar,
            credentialed,
            plain,
        })
    }

    /// Seed the cookie jar (e.g. the refresh cookie from a login)
    pub fn add_cookie(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.base);
    }

    fn url_for(&self, segments: &[String]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.segments);
        let client = if request.with_credentials {
            &self.credentialed
        } else {
            &self.plain
        };

        let mut builder = match request.method {
            Method::Get => client.get(url),
            Method::Post => client.post(url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(path = %request.path(), status, len = bytes.len(), "HTTP response");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok(ApiResponse { status, body })
    }
}
