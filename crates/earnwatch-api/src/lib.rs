//! Earnwatch API - Backend calls for the watch guard
//!
//! - `HttpTransport`: the seam to the network, with a reqwest
//!   implementation carrying a cookie jar for the refresh endpoint
//! - `AuthClient`: bearer-authenticated requests with one-shot token
//!   refresh, shared by every authenticated call
//! - `CompletionReporter`: `like` and `mark_complete` for a video
//!
//! # Example
//!
//! ```rust,ignore
//! use earnwatch_api::{ApiConfig, AuthClient, CompletionReporter, ReqwestTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::new("https://api.example.com");
//! let transport = ReqwestTransport::new(&config)?;
//! let client = std::sync::Arc::new(AuthClient::new(transport, config.clone()));
//! client.tokens().set("access-token");
//!
//! let reporter = CompletionReporter::new(client, &config);
//! reporter.mark_complete(&"video-1".into(), 93.0).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod reporter;
pub mod token;
pub mod transport;

pub use auth::AuthClient;
pub use config::ApiConfig;
pub use error::{ApiError, TransportError};
pub use reporter::{CompletionReporter, LikeOutcome, MarkOutcome, VerifyVideoRequest};
pub use token::TokenStore;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
