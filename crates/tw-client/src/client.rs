//! Request dispatcher: signing, sending and classifying Twitter API calls.

use std::sync::Arc;
use std::time::Duration;

use birdwire_auth::{Credentials, OAuth1Signer};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{ApiRequest, BodyChannel, FilePart, RequestTarget};
use crate::response::{classify, Outcome, Payload, RateLimitInfo};
use crate::retry::{RateLimitRetrier, SleepFuture};

/// HTTP client for the Twitter API.
///
/// Owns the credentials and the request signer. Every call goes through
/// [`execute`](Self::execute): sign, send once, classify, and on a 429
/// sleep and re-send once.
#[derive(Debug, Clone)]
pub struct TwitterHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
    credentials: Arc<Credentials>,
    signer: Option<Arc<OAuth1Signer>>,
    retrier: Option<RateLimitRetrier>,
}

impl TwitterHttpClient {
    /// Create a new HTTP client.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        // Signing is checked again per request so a bearer-only client
        // still reports which OAuth 1.0a field is missing.
        let signer = OAuth1Signer::from_credentials(&credentials)
            .ok()
            .map(Arc::new);
        let retrier = config.rate_limit.clone().map(RateLimitRetrier::new);

        Ok(Self {
            inner,
            config,
            credentials: Arc::new(credentials),
            signer,
            retrier,
        })
    }

    /// Create a new HTTP client with default configuration.
    pub fn with_credentials(credentials: Credentials) -> Result<Self> {
        Self::new(credentials, ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sleep through the configured sleeper.
    pub fn sleep(&self, duration: Duration) -> SleepFuture {
        self.config.sleeper.sleep(duration)
    }

    /// Full URL a request is sent to, without its query string.
    pub fn url_for(&self, request: &ApiRequest) -> String {
        match request.target() {
            RequestTarget::Absolute(url) => url.clone(),
            RequestTarget::Api { version, path } => {
                let base = self.config.api_base_url.trim_end_matches('/');
                let version = version.trim_matches('/');
                let path = path.trim_start_matches('/');
                if version.is_empty() {
                    format!("{base}/{path}")
                } else {
                    format!("{base}/{version}/{path}")
                }
            }
        }
    }

    /// Execute a request, retrying once if it is rate limited.
    #[instrument(skip(self, request), fields(method = ?request.method(), target = ?request.target()))]
    pub async fn execute(&self, request: &ApiRequest) -> Result<Payload> {
        let outcome = match &self.retrier {
            Some(retrier) => {
                retrier
                    .run(self.config.sleeper.as_ref(), || self.dispatch(request))
                    .await?
            }
            None => self.dispatch(request).await?,
        };

        outcome.into_result()
    }

    /// Execute a request and deserialize the JSON response.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T> {
        self.execute(request).await?.deserialize()
    }

    /// Send a request exactly once and classify the response.
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<Outcome> {
        let base_url = self.url_for(request);
        let mut url = url::Url::parse(&base_url)?;
        if !request.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_params.iter());
        }

        let mut req = self.inner.request(request.method.to_reqwest(), url.as_str());

        // A signed request always carries its own signature.
        for (name, value) in &request.headers {
            if request.auth && name.eq_ignore_ascii_case("authorization") {
                continue;
            }
            req = req.header(name.as_str(), value.as_str());
        }

        if request.auth || !request.has_authorization_header() {
            req = req.header(AUTHORIZATION, self.authorization(request, &base_url)?);
        }

        if request.drops_json_body() {
            debug!("Request has both JSON and form data, sending form data only");
        }

        req = match request.body_channel() {
            BodyChannel::None => req,
            BodyChannel::Json(value) => req.json(value),
            BodyChannel::Form(fields) => req
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(serde_urlencoded::to_string(fields).map_err(|e| {
                    Error::with_source(ErrorKind::InvalidArgument(e.to_string()), e)
                })?),
            BodyChannel::Multipart { fields, file } => req.multipart(multipart_form(fields, file)?),
        };

        if self.config.enable_tracing {
            debug!(
                method = ?request.method,
                url = %base_url,
                oauth1 = request.auth,
                "Sending request"
            );
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let rate_limit = RateLimitInfo::from_headers(response.headers());

        if self.config.enable_tracing {
            let content_length = response.content_length();
            if response.status().is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
            if rate_limit.is_exhausted() {
                debug!(reset = ?rate_limit.reset, "Rate limit window exhausted");
            }
        }

        let body = response.bytes().await?;
        Ok(classify(status, &rate_limit, &body, request.is_json))
    }

    fn authorization(&self, request: &ApiRequest, base_url: &str) -> Result<String> {
        if !request.auth {
            return Ok(format!("Bearer {}", self.credentials.bearer_token()));
        }

        let signer = match &self.signer {
            Some(signer) => signer,
            None => {
                // Names the first missing field.
                self.credentials.oauth1_keys()?;
                return Err(Error::new(ErrorKind::Config(
                    "OAuth 1.0a signer unavailable".to_string(),
                )));
            }
        };

        Ok(signer.sign(
            request.method.as_str(),
            base_url,
            &request.signature_params(),
        )?)
    }
}

fn multipart_form(fields: &[(String, String)], file: &FilePart) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }

    let mut part = reqwest::multipart::Part::bytes(file.bytes.to_vec());
    if let Some(name) = &file.file_name {
        part = part.file_name(name.clone());
    }
    if let Some(mime) = &file.mime_type {
        part = part.mime_str(mime)?;
    }

    Ok(form.part(file.field.clone(), part))
}
