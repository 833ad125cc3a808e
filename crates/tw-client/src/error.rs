//! Error types for tw-client.

/// Result type alias for tw-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tw-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound(_))
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// Returns true if a required credential was not configured.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingCredential(_))
    }

    /// Returns true if the API rejected the request itself (4xx family).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::BadRequest(_)
                | ErrorKind::Unauthorized(_)
                | ErrorKind::Forbidden(_)
                | ErrorKind::NotFound(_)
                | ErrorKind::Conflict(_)
                | ErrorKind::InvalidRule(_)
                | ErrorKind::Api(_)
        )
    }

    /// Epoch second at which the rate limit window resets, if known.
    pub fn rate_limit_reset(&self) -> Option<i64> {
        match self.kind {
            ErrorKind::RateLimited { reset } => reset,
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A credential required for this action was not configured.
    #[error("{0} is a required credential for this action")]
    MissingCredential(String),

    /// HTTP 400.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 401.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// HTTP 404, or a 200 whose error entry reports a missing resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 409.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded (HTTP 429) and the single retry was also limited.
    #[error("Rate limited{}", reset.map(|r| format!(", window resets at {}", r)).unwrap_or_default())]
    RateLimited { reset: Option<i64> },

    /// A filtered-stream rule could not be parsed.
    #[error("Invalid stream rule: {0}")]
    InvalidRule(String),

    /// A 200 response carrying an `errors` array.
    #[error("Twitter API error: {0}")]
    Api(String),

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Media upload failed or an upload precondition was violated.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Status code outside the documented set.
    #[error("Unknown status {status}: {message}")]
    UnknownStatus { status: u16, message: String },

    /// A caller-supplied argument was invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// IO error while reading request data.
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<birdwire_auth::Error> for Error {
    fn from(err: birdwire_auth::Error) -> Self {
        let kind = match &err.kind {
            birdwire_auth::ErrorKind::MissingCredential(field) => {
                ErrorKind::MissingCredential(field.clone())
            }
            other => ErrorKind::Config(other.to_string()),
        };
        Error::with_source(kind, err)
    }
}
