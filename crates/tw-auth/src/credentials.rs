//! Twitter API credentials.
//!
//! All secrets are redacted in Debug output.

use crate::error::{Error, ErrorKind, Result};
use crate::{
    ENV_ACCESS_TOKEN, ENV_ACCESS_TOKEN_SECRET, ENV_BEARER_TOKEN, ENV_CONSUMER_KEY,
    ENV_CONSUMER_SECRET,
};

/// Credentials for the Twitter API.
///
/// The bearer token authenticates app-only (read) requests. The four
/// OAuth 1.0a fields are needed for any user-context request; they are
/// optional at construction and checked when a request asks for them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    bearer_token: String,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Credentials")
            .field("bearer_token", &"[REDACTED]")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .finish()
    }
}

/// Borrowed view of a complete set of OAuth 1.0a keys.
#[derive(Clone, Copy)]
pub struct OAuth1Keys<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    pub access_token: &'a str,
    pub access_token_secret: &'a str,
}

impl std::fmt::Debug for OAuth1Keys<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Keys")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Create credentials with every field set.
    pub fn new(
        bearer_token: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            consumer_key: Some(consumer_key.into()),
            consumer_secret: Some(consumer_secret.into()),
            access_token: Some(access_token.into()),
            access_token_secret: Some(access_token_secret.into()),
        }
    }

    /// Create app-only credentials (read endpoints only).
    pub fn bearer(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            ..Default::default()
        }
    }

    /// Set the consumer key and secret.
    pub fn with_consumer(
        mut self,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        self.consumer_key = Some(consumer_key.into());
        self.consumer_secret = Some(consumer_secret.into());
        self
    }

    /// Set the user access token and secret.
    pub fn with_access_token(
        mut self,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        self.access_token = Some(access_token.into());
        self.access_token_secret = Some(access_token_secret.into());
        self
    }

    /// Load credentials from environment variables.
    ///
    /// Required:
    /// - `TWITTER_BEARER_TOKEN`
    ///
    /// Optional (all four are needed for user-context requests):
    /// - `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`
    /// - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let bearer_token = non_empty(ENV_BEARER_TOKEN)
            .ok_or_else(|| Error::new(ErrorKind::EnvVar(ENV_BEARER_TOKEN.to_string())))?;

        let creds = Self {
            bearer_token,
            consumer_key: non_empty(ENV_CONSUMER_KEY),
            consumer_secret: non_empty(ENV_CONSUMER_SECRET),
            access_token: non_empty(ENV_ACCESS_TOKEN),
            access_token_secret: non_empty(ENV_ACCESS_TOKEN_SECRET),
        };

        if !creds.has_oauth1() {
            tracing::warn!("OAuth 1.0a credentials incomplete; user-context requests will fail");
        }

        Ok(creds)
    }

    /// Get the bearer token.
    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// Get the consumer key, if configured.
    pub fn consumer_key(&self) -> Option<&str> {
        self.consumer_key.as_deref()
    }

    /// Get the access token, if configured.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns true if all four OAuth 1.0a fields are present.
    pub fn has_oauth1(&self) -> bool {
        self.oauth1_keys().is_ok()
    }

    /// Borrow the complete set of OAuth 1.0a keys.
    ///
    /// Fails with `MissingCredential` naming the first absent field.
    pub fn oauth1_keys(&self) -> Result<OAuth1Keys<'_>> {
        fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::missing(field))
        }

        Ok(OAuth1Keys {
            consumer_key: require(&self.consumer_key, "consumer_key")?,
            consumer_secret: require(&self.consumer_secret, "consumer_secret")?,
            access_token: require(&self.access_token, "access_token")?,
            access_token_secret: require(&self.access_token_secret, "access_token_secret")?,
        })
    }

    /// The numeric id of the account the access token belongs to.
    ///
    /// User access tokens are issued as `<user id>-<token>`.
    pub fn user_id(&self) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        let (id, rest) = token.split_once('-')?;
        if !rest.is_empty() && !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            Some(id)
        } else {
            None
        }
    }
}
