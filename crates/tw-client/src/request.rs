//! Request model for Twitter API calls.

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Upper-case method name, as used in the OAuth base string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// `<api base>/<version><path>`.
    Api { version: String, path: String },
    /// A fully qualified URL (the upload host).
    Absolute(String),
}

/// A binary part of a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// Raw content.
    pub bytes: Bytes,
    /// Optional file name sent with the part.
    pub file_name: Option<String>,
    /// Optional MIME type of the part.
    pub mime_type: Option<String>,
}

impl FilePart {
    /// Create a part with the given field name and content.
    pub fn new(field: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            bytes: bytes.into(),
            file_name: None,
            mime_type: None,
        }
    }

    /// Set the file name.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the MIME type.
    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }
}

/// The body actually sent for a request.
///
/// Form data takes precedence: a request carrying both JSON and form
/// fields (or a file part) is sent as a form and the JSON is dropped.
#[derive(Debug)]
pub(crate) enum BodyChannel<'a> {
    None,
    Json(&'a serde_json::Value),
    Form(&'a [(String, String)]),
    Multipart {
        fields: &'a [(String, String)],
        file: &'a FilePart,
    },
}

/// A single Twitter API call.
///
/// Built fresh for every call. The dispatcher only ever re-sends the same
/// value when a rate-limited attempt is retried.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: RequestMethod,
    pub(crate) target: RequestTarget,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) json: Option<serde_json::Value>,
    pub(crate) form: Vec<(String, String)>,
    pub(crate) file: Option<FilePart>,
    pub(crate) is_json: bool,
    pub(crate) auth: bool,
}

impl ApiRequest {
    /// Create a request against the versioned REST API.
    pub fn new(method: RequestMethod, version: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_target(
            method,
            RequestTarget::Api {
                version: version.into(),
                path: path.into(),
            },
        )
    }

    /// Create a request against a fully qualified URL.
    pub fn absolute(method: RequestMethod, url: impl Into<String>) -> Self {
        Self::with_target(method, RequestTarget::Absolute(url.into()))
    }

    fn with_target(method: RequestMethod, target: RequestTarget) -> Self {
        Self {
            method,
            target,
            headers: Vec::new(),
            query_params: Vec::new(),
            json: None,
            form: Vec::new(),
            file: None,
            is_json: true,
            auth: false,
        }
    }

    /// Create a GET request.
    pub fn get(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, version, path)
    }

    /// Create a POST request.
    pub fn post(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, version, path)
    }

    /// Create a PUT request.
    pub fn put(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Put, version, path)
    }

    /// Create a DELETE request.
    pub fn delete(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, version, path)
    }

    /// Add a header. A caller-supplied `Authorization` header replaces
    /// the default bearer header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter when the value is present.
    pub fn query_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.json = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set raw JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Add a form field.
    pub fn form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Attach a file part; the body is sent as `multipart/form-data`.
    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    /// Return the response body as raw text without JSON decoding.
    pub fn raw_text(mut self) -> Self {
        self.is_json = false;
        self
    }

    /// Sign the request with the user's OAuth 1.0a credentials.
    pub fn oauth1(mut self) -> Self {
        self.auth = true;
        self
    }

    /// Set whether the request is OAuth 1.0a signed.
    pub fn with_auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Request target.
    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    /// Query parameters in insertion order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// Whether the response body is decoded as JSON.
    pub fn is_json(&self) -> bool {
        self.is_json
    }

    /// Whether the request is OAuth 1.0a signed.
    pub fn is_oauth1(&self) -> bool {
        self.auth
    }

    /// Returns true if the caller supplied an `Authorization` header.
    pub fn has_authorization_header(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"))
    }

    /// Returns true if a JSON body is set but form data takes its place.
    pub(crate) fn drops_json_body(&self) -> bool {
        self.has_form() && self.json.is_some()
    }

    fn has_form(&self) -> bool {
        !self.form.is_empty() || self.file.is_some()
    }

    pub(crate) fn body_channel(&self) -> BodyChannel<'_> {
        let has_form = self.has_form();
        match (&self.file, has_form, &self.json) {
            (Some(file), _, _) => BodyChannel::Multipart {
                fields: &self.form,
                file,
            },
            (None, true, _) => BodyChannel::Form(&self.form),
            (None, false, Some(json)) => BodyChannel::Json(json),
            (None, false, None) => BodyChannel::None,
        }
    }

    /// Parameters covered by an OAuth 1.0a signature: the query string and
    /// a URL-encoded form body. Multipart and JSON bodies are not signed.
    pub(crate) fn signature_params(&self) -> Vec<(String, String)> {
        let mut params = self.query_params.clone();
        if let BodyChannel::Form(form) = self.body_channel() {
            params.extend(form.iter().cloned());
        }
        params
    }
}
