//! Error types for tw-auth.
//!
//! Error messages name the offending credential field, never its value.

/// Result type alias for tw-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tw-auth operations.
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

    /// Create a missing-credential error naming the absent field.
    pub fn missing(field: &str) -> Self {
        Self::new(ErrorKind::MissingCredential(field.to_string()))
    }

    /// Returns true if a required credential field was absent.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingCredential(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A credential required for this action was not configured.
    #[error("{0} is a required credential for this action")]
    MissingCredential(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Request signing failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::with_source(ErrorKind::EnvVar(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Signing(format!("Invalid URL: {}", err)), err)
    }
}
