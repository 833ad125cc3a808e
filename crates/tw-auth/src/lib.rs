//! # tw-auth
//!
//! Twitter API authentication for the birdwire client.
//!
//! ## Security
//!
//! - Tokens and secrets are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - A request that needs user context never silently falls back to
//!   app-only (bearer) authentication; a missing OAuth 1.0a field is a
//!   named [`ErrorKind::MissingCredential`] error
//!
//! ## Supported Authentication Methods
//!
//! - **App-only bearer token** - For read endpoints
//! - **OAuth 1.0a (one-legged, HMAC-SHA1)** - For user-context and write
//!   endpoints, and for the media upload host
//!
//! ## Example
//!
//! ```rust,ignore
//! use birdwire_auth::{Credentials, OAuth1Signer};
//!
//! let creds = Credentials::from_env()?;
//! let signer = OAuth1Signer::from_credentials(&creds)?;
//! let header = signer.sign("POST", "https://api.twitter.com/2/tweets", &[])?;
//! ```

mod credentials;
mod error;
mod oauth1;

pub use credentials::{Credentials, OAuth1Keys};
pub use error::{Error, ErrorKind, Result};
pub use oauth1::{percent_encode, OAuth1Signer};

/// Environment variable holding the app-only bearer token.
pub const ENV_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
/// Environment variable holding the consumer (API) key.
pub const ENV_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
/// Environment variable holding the consumer (API) secret.
pub const ENV_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
/// Environment variable holding the user access token.
pub const ENV_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
/// Environment variable holding the user access token secret.
pub const ENV_ACCESS_TOKEN_SECRET: &str = "TWITTER_ACCESS_TOKEN_SECRET";
