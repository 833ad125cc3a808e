//! # tw-client
//!
//! Core HTTP pipeline for the Twitter API.
//!
//! This crate provides the foundation every endpoint call goes through:
//! - Bearer or OAuth 1.0a signing of each request
//! - One unified classifier turning status + body into an [`Outcome`]
//!   (Twitter reports some failures as HTTP 200 with an `errors` array)
//! - Sleep-until-reset and a single re-issue on HTTP 429
//! - Sanitized error bodies, rate-limit header parsing, request tracing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (tw-rest endpoint wrappers, tw-media uploader)             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TwitterHttpClient                         │
//! │  - Holds credentials + signer + HTTP pool                   │
//! │  - execute(): RateLimitRetrier around dispatch()            │
//! │  - dispatch(): sign, send once, classify                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 classify() -> Outcome                       │
//! │  Success | EmptyCollection | EmptySuccess | RateLimited     │
//! │  ClientError | ServerError | Malformed                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use birdwire_auth::Credentials;
//! use birdwire_client::{ApiRequest, TwitterHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), birdwire_client::Error> {
//!     let client = TwitterHttpClient::with_credentials(Credentials::from_env()?)?;
//!
//!     let me = client
//!         .execute(&ApiRequest::get("2", "/users/me").oauth1())
//!         .await?
//!         .into_json()?;
//!
//!     println!("{}", me["data"]["username"]);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;

pub use client::TwitterHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{ApiRequest, FilePart, RequestMethod, RequestTarget};
pub use response::{classify, ClientErrorKind, Outcome, Payload, RateLimitInfo, ResponseBody};
pub use retry::{RateLimitConfig, RateLimitRetrier, SleepFuture, Sleeper, TokioSleeper};

/// Default REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

/// Default media upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

/// Version segment of the v2 API.
pub const API_V2: &str = "2";

/// Version segment of the legacy v1.1 API.
pub const API_V1_1: &str = "1.1";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("birdwire/", env!("CARGO_PKG_VERSION"));
