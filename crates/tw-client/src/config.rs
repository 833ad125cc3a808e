//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::retry::{RateLimitConfig, Sleeper, TokioSleeper};

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API; version and path are appended.
    pub api_base_url: String,
    /// Absolute URL of the media upload endpoint.
    pub upload_url: String,
    /// Rate-limit retry configuration. `None` surfaces 429s immediately.
    pub rate_limit: Option<RateLimitConfig>,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// User-Agent header value.
    pub user_agent: String,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
    /// Sleeper used for rate-limit and upload-processing waits.
    pub sleeper: Arc<dyn Sleeper>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: crate::DEFAULT_API_BASE_URL.to_string(),
            upload_url: crate::DEFAULT_UPLOAD_URL.to_string(),
            rate_limit: Some(RateLimitConfig::default()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: crate::USER_AGENT.to_string(),
            enable_tracing: true,
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the REST API base URL (e.g. a mock server in tests).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    /// Set the media upload URL.
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.upload_url = url.into();
        self
    }

    /// Set the rate-limit retry configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = Some(rate_limit);
        self
    }

    /// Disable the sleep-and-retry on 429.
    pub fn without_rate_limit_retry(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set pool idle timeout.
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Replace the sleeper used for every wait.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.config.sleeper = sleeper;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "https://api.twitter.com");
        assert_eq!(
            config.upload_url,
            "https://upload.twitter.com/1.1/media/upload.json"
        );
        assert!(config.rate_limit.as_ref().is_some_and(|r| r.max_wait.is_none()));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("birdwire/"));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .with_api_base_url("http://127.0.0.1:9999")
            .with_upload_url("http://127.0.0.1:9999/upload.json")
            .with_timeout(Duration::from_secs(60))
            .without_rate_limit_retry()
            .with_user_agent("custom-agent/1.0")
            .with_tracing(false)
            .build();

        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.upload_url, "http://127.0.0.1:9999/upload.json");
        assert!(config.rate_limit.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "custom-agent/1.0");
        assert!(!config.enable_tracing);
    }

    #[test]
    fn test_rate_limit_config() {
        let config = ClientConfig::builder()
            .with_rate_limit(RateLimitConfig::default().with_max_wait(Duration::from_secs(5)))
            .build();
        assert_eq!(
            config.rate_limit.and_then(|r| r.max_wait),
            Some(Duration::from_secs(5))
        );
    }
}
