//! # birdwire
//!
//! A Twitter API client library for Rust.
//!
//! This library signs, dispatches and classifies every API call, backs off
//! on rate limits, uploads media in chunks, and turns the flat `includes`
//! of v2 responses back into connected entities.
//!
//! ## Security
//!
//! - Secrets are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error bodies are truncated and have tokens and signatures redacted
//! - OAuth 1.0a requests fail before sending when a key is missing
//!
//! ## Crates
//!
//! - **birdwire-auth** - Credentials and OAuth 1.0a HMAC-SHA1 signing
//! - **birdwire-client** - Request dispatch, outcome classification, rate-limit retry
//! - **birdwire-media** - Chunked media upload (INIT/APPEND/FINALIZE/STATUS)
//! - **birdwire-rest** - Entity merging, pagination, caches, endpoint wrappers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use birdwire::{Credentials, TwitterClient};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TwitterClient::new(Credentials::from_env()?)?;
//!
//!     let mut timeline = client.user_tweets("2244994945")?;
//!     while let Some(tweet) = timeline.try_next().await? {
//!         println!("{}", tweet.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use birdwire_auth as auth;
#[cfg(feature = "client")]
pub use birdwire_client as client;
#[cfg(feature = "media")]
pub use birdwire_media as media;
#[cfg(feature = "rest")]
pub use birdwire_rest as rest;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use birdwire_auth::Credentials;
#[cfg(feature = "client")]
pub use birdwire_client::{ApiRequest, ClientConfig, Error, ErrorKind, Result, TwitterHttpClient};
#[cfg(feature = "media")]
pub use birdwire_media::{MediaFile, MediaUploader};
#[cfg(feature = "rest")]
pub use birdwire_rest::{NewMessage, NewTweet, TwitterClient};
