//! Response classification.
//!
//! Every dispatch attempt is reduced to exactly one [`Outcome`] by
//! [`classify`]. Twitter reports some failures with HTTP 200 and an
//! `errors` array in the body, so status and body are inspected together
//! in one place.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, ErrorKind, Result};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded JSON document.
    Json(Value),
    /// Raw text, for requests made with `is_json = false`.
    Text(String),
}

/// Client-side error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    /// A filtered-stream rule was rejected.
    InvalidRule,
    /// Any other entry of a 200 response's `errors` array.
    Generic,
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 200 with a usable body.
    Success(ResponseBody),
    /// 200 with `meta.result_count == 0`.
    EmptyCollection,
    /// 201, 202 or 204. The body is never inspected.
    EmptySuccess,
    /// 429. `reset` is the epoch second the window ends, when reported.
    RateLimited { reset: Option<i64> },
    /// The request was rejected.
    ClientError { kind: ClientErrorKind, detail: String },
    /// Any status outside the documented set.
    ServerError { status: u16, detail: String },
    /// A 200 whose body could not be decoded.
    Malformed(String),
}

impl Outcome {
    /// Returns true for `RateLimited`.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Outcome::RateLimited { .. })
    }

    /// Convert into the caller-facing result.
    pub fn into_result(self) -> Result<Payload> {
        let kind = match self {
            Outcome::Success(ResponseBody::Json(value)) => return Ok(Payload::Json(value)),
            Outcome::Success(ResponseBody::Text(text)) => return Ok(Payload::Text(text)),
            Outcome::EmptyCollection => return Ok(Payload::EmptyCollection),
            Outcome::EmptySuccess => return Ok(Payload::Empty),
            Outcome::RateLimited { reset } => ErrorKind::RateLimited { reset },
            Outcome::ClientError { kind, detail } => match kind {
                ClientErrorKind::BadRequest => ErrorKind::BadRequest(detail),
                ClientErrorKind::Unauthorized => ErrorKind::Unauthorized(detail),
                ClientErrorKind::Forbidden => ErrorKind::Forbidden(detail),
                ClientErrorKind::NotFound => ErrorKind::NotFound(detail),
                ClientErrorKind::Conflict => ErrorKind::Conflict(detail),
                ClientErrorKind::InvalidRule => ErrorKind::InvalidRule(detail),
                ClientErrorKind::Generic => ErrorKind::Api(detail),
            },
            Outcome::ServerError { status, detail } => ErrorKind::UnknownStatus {
                status,
                message: detail,
            },
            Outcome::Malformed(detail) => ErrorKind::MalformedResponse(detail),
        };
        Err(Error::new(kind))
    }
}

/// What a successful call hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    /// The query matched nothing. Callers iterating results see no items.
    EmptyCollection,
    /// The call succeeded without a body.
    Empty,
}

impl Payload {
    /// Returns true for an empty result set.
    pub fn is_empty_collection(&self) -> bool {
        matches!(self, Payload::EmptyCollection)
    }

    /// The JSON document. Text bodies are decoded on demand.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(text) => Ok(serde_json::from_str(&text)?),
            Payload::EmptyCollection | Payload::Empty => Err(Error::new(
                ErrorKind::MalformedResponse("response has no body".to_string()),
            )),
        }
    }

    /// Deserialize the JSON document.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_json()?)?)
    }

    /// The raw text body, if the request asked for one.
    pub fn into_text(self) -> Option<String> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Rate limit state reported in response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed per window (`x-rate-limit-limit`).
    pub limit: Option<u32>,
    /// Requests left in the window (`x-rate-limit-remaining`).
    pub remaining: Option<u32>,
    /// Epoch second the window resets (`x-rate-limit-reset`).
    pub reset: Option<i64>,
}

impl RateLimitInfo {
    /// Parse the rate limit headers; absent or unparsable values are `None`.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &reqwest::header::HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }

        Self {
            limit: parse(headers, "x-rate-limit-limit"),
            remaining: parse(headers, "x-rate-limit-remaining"),
            reset: parse(headers, "x-rate-limit-reset"),
        }
    }

    /// Returns true if no requests are left in the current window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Classify one HTTP response.
pub fn classify(status: u16, rate_limit: &RateLimitInfo, body: &[u8], is_json: bool) -> Outcome {
    let client_error = |kind| Outcome::ClientError {
        kind,
        detail: sanitize_error_message(&String::from_utf8_lossy(body)),
    };

    match status {
        200 => classify_ok(body, is_json),
        201 | 202 | 204 => Outcome::EmptySuccess,
        400 => client_error(ClientErrorKind::BadRequest),
        401 => client_error(ClientErrorKind::Unauthorized),
        403 => client_error(ClientErrorKind::Forbidden),
        404 => client_error(ClientErrorKind::NotFound),
        409 => client_error(ClientErrorKind::Conflict),
        429 => Outcome::RateLimited {
            reset: rate_limit.reset,
        },
        _ => Outcome::ServerError {
            status,
            detail: sanitize_error_message(&String::from_utf8_lossy(body)),
        },
    }
}

fn classify_ok(body: &[u8], is_json: bool) -> Outcome {
    if !is_json {
        return Outcome::Success(ResponseBody::Text(
            String::from_utf8_lossy(body).into_owned(),
        ));
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => return Outcome::Malformed(e.to_string()),
    };

    if let Some(outcome) = classify_errors(&value) {
        return outcome;
    }

    if value.pointer("/meta/result_count").and_then(Value::as_u64) == Some(0) {
        return Outcome::EmptyCollection;
    }

    Outcome::Success(ResponseBody::Json(value))
}

/// Inspect the first entry of a populated `errors` array.
fn classify_errors(value: &Value) -> Option<Outcome> {
    let first = value.get("errors")?.as_array()?.first()?;

    let detail = first.get("detail").and_then(Value::as_str);
    if let Some(detail) = detail.filter(|d| d.starts_with("Could not find")) {
        return Some(Outcome::ClientError {
            kind: ClientErrorKind::NotFound,
            detail: detail.to_string(),
        });
    }

    if let Some(rule) = first
        .pointer("/details/0")
        .and_then(Value::as_str)
        .filter(|d| d.starts_with("Cannot parse rule"))
    {
        let summary = |field: &str| {
            value
                .pointer(&format!("/meta/summary/{field}"))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        warn!(
            created = summary("created"),
            not_created = summary("not_created"),
            valid = summary("valid"),
            invalid = summary("invalid"),
            "Stream rule rejected: {}",
            rule
        );
        return Some(Outcome::ClientError {
            kind: ClientErrorKind::InvalidRule,
            detail: rule.to_string(),
        });
    }

    let detail = detail
        .or_else(|| first.get("message").and_then(Value::as_str))
        .or_else(|| first.get("title").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| first.to_string());

    Some(Outcome::ClientError {
        kind: ClientErrorKind::Generic,
        detail: sanitize_error_message(&detail),
    })
}

/// Sanitize an error message to prevent exposing sensitive data.
///
/// This function:
/// - Redacts bearer tokens
/// - Redacts OAuth signatures and tokens echoed from an Authorization header
/// - Redacts user access tokens (`<id>-<secret>`)
/// - Truncates messages longer than 500 bytes
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();
    sanitized = redact(&sanitized, r"Bearer\s+[A-Za-z0-9%._~+/=-]+", "Bearer [REDACTED]");
    sanitized = redact(
        &sanitized,
        r#"oauth_(signature|token|consumer_key)="[^"]*""#,
        r#"oauth_${1}="[REDACTED]""#,
    );
    sanitized = redact(&sanitized, r"\b[0-9]+-[A-Za-z0-9]{20,}", "[REDACTED_TOKEN]");

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

fn redact(text: &str, pattern: &str, replacement: &str) -> String {
    match regex_lite::Regex::new(pattern) {
        Ok(re) => re.replace_all(text, replacement).into_owned(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_json(status: u16, body: Value) -> Outcome {
        classify(
            status,
            &RateLimitInfo::default(),
            body.to_string().as_bytes(),
            true,
        )
    }

    #[test]
    fn test_empty_success_ignores_body() {
        for status in [201, 202, 204] {
            let outcome = classify(status, &RateLimitInfo::default(), b"not json at all", true);
            assert_eq!(outcome, Outcome::EmptySuccess);
        }
    }

    #[test]
    fn test_success_json() {
        let body = json!({"data": {"id": "1", "text": "hi"}});
        assert_eq!(
            classify_json(200, body.clone()),
            Outcome::Success(ResponseBody::Json(body))
        );
    }

    #[test]
    fn test_success_text_is_not_decoded() {
        let outcome = classify(200, &RateLimitInfo::default(), b"{\"errors\": [1]}", false);
        assert_eq!(
            outcome,
            Outcome::Success(ResponseBody::Text("{\"errors\": [1]}".to_string()))
        );
    }

    #[test]
    fn test_not_found_in_errors_array() {
        let outcome = classify_json(
            200,
            json!({"errors": [{"detail": "Could not find user with id: 123"}]}),
        );
        assert_eq!(
            outcome,
            Outcome::ClientError {
                kind: ClientErrorKind::NotFound,
                detail: "Could not find user with id: 123".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_rule() {
        let outcome = classify_json(
            200,
            json!({
                "errors": [{"details": ["Cannot parse rule: unmatched paren"], "title": "Invalid Rule"}],
                "meta": {"summary": {"created": 0, "not_created": 1, "valid": 0, "invalid": 1}}
            }),
        );
        assert!(matches!(
            outcome,
            Outcome::ClientError {
                kind: ClientErrorKind::InvalidRule,
                ..
            }
        ));
    }

    #[test]
    fn test_generic_error_entry() {
        let outcome = classify_json(
            200,
            json!({"errors": [{"code": 187, "message": "Status is a duplicate."}]}),
        );
        assert_eq!(
            outcome,
            Outcome::ClientError {
                kind: ClientErrorKind::Generic,
                detail: "Status is a duplicate.".to_string()
            }
        );
    }

    #[test]
    fn test_empty_errors_array_is_ignored() {
        let body = json!({"errors": [], "data": {"id": "1"}});
        assert_eq!(
            classify_json(200, body.clone()),
            Outcome::Success(ResponseBody::Json(body))
        );
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(
            classify_json(200, json!({"meta": {"result_count": 0}})),
            Outcome::EmptyCollection
        );
        assert!(matches!(
            classify_json(200, json!({"data": [{"id": "1"}], "meta": {"result_count": 1}})),
            Outcome::Success(_)
        ));
    }

    #[test]
    fn test_malformed_200() {
        let outcome = classify(200, &RateLimitInfo::default(), b"<html>oops", true);
        assert!(matches!(outcome, Outcome::Malformed(_)));

        let outcome = classify(200, &RateLimitInfo::default(), b"", true);
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }

    #[test]
    fn test_client_error_statuses() {
        let cases = [
            (400, ClientErrorKind::BadRequest),
            (401, ClientErrorKind::Unauthorized),
            (403, ClientErrorKind::Forbidden),
            (404, ClientErrorKind::NotFound),
            (409, ClientErrorKind::Conflict),
        ];
        for (status, expected) in cases {
            match classify(status, &RateLimitInfo::default(), b"{\"title\":\"x\"}", true) {
                Outcome::ClientError { kind, detail } => {
                    assert_eq!(kind, expected);
                    assert_eq!(detail, "{\"title\":\"x\"}");
                }
                other => panic!("status {status}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_rate_limited_carries_reset() {
        let info = RateLimitInfo {
            limit: Some(900),
            remaining: Some(0),
            reset: Some(1_700_000_000),
        };
        assert_eq!(
            classify(429, &info, b"", true),
            Outcome::RateLimited {
                reset: Some(1_700_000_000)
            }
        );
        assert_eq!(
            classify(429, &RateLimitInfo::default(), b"", true),
            Outcome::RateLimited { reset: None }
        );
    }

    #[test]
    fn test_other_status_is_server_error() {
        for status in [500, 503, 418, 206] {
            assert!(matches!(
                classify(status, &RateLimitInfo::default(), b"boom", true),
                Outcome::ServerError { status: s, .. } if s == status
            ));
        }
    }

    #[test]
    fn test_into_result_maps_error_kinds() {
        let err = Outcome::ClientError {
            kind: ClientErrorKind::NotFound,
            detail: "gone".into(),
        }
        .into_result()
        .unwrap_err();
        assert!(err.is_not_found());

        let err = Outcome::RateLimited { reset: Some(5) }
            .into_result()
            .unwrap_err();
        assert_eq!(err.rate_limit_reset(), Some(5));

        let err = Outcome::ServerError {
            status: 503,
            detail: "over capacity".into(),
        }
        .into_result()
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownStatus { status: 503, .. }));

        assert_eq!(
            Outcome::EmptyCollection.into_result().unwrap(),
            Payload::EmptyCollection
        );
        assert_eq!(Outcome::EmptySuccess.into_result().unwrap(), Payload::Empty);
    }

    #[test]
    fn test_payload_accessors() {
        #[derive(serde::Deserialize)]
        struct Data {
            data: Value,
        }

        let payload = Payload::Json(json!({"data": {"id": "1"}}));
        let data: Data = payload.deserialize().unwrap();
        assert_eq!(data.data["id"], "1");

        assert_eq!(
            Payload::Text("{\"a\":1}".into()).into_json().unwrap(),
            json!({"a": 1})
        );
        assert!(Payload::Empty.into_json().is_err());
        assert_eq!(Payload::Text("raw".into()).into_text(), Some("raw".into()));
        assert!(Payload::EmptyCollection.is_empty_collection());
    }

    #[test]
    fn test_rate_limit_info_from_headers() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-rate-limit-limit", "900".parse().unwrap());
        headers.insert("x-rate-limit-remaining", "0".parse().unwrap());
        headers.insert("x-rate-limit-reset", "1700000000".parse().unwrap());

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.limit, Some(900));
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.reset, Some(1_700_000_000));
        assert!(info.is_exhausted());

        let info = RateLimitInfo::from_headers(&reqwest::header::HeaderMap::new());
        assert_eq!(info, RateLimitInfo::default());
        assert!(!info.is_exhausted());
    }

    // =========================================================================
    // sanitize_error_message tests
    // =========================================================================

    #[test]
    fn test_sanitize_redacts_bearer_tokens() {
        let msg = "Invalid header: Bearer AAAAAAAAAAAAAAAAAAAAAMLheAAAAAAA0%2BuSeid";
        let sanitized = sanitize_error_message(msg);
        assert!(sanitized.contains("Bearer [REDACTED]"), "{sanitized}");
        assert!(!sanitized.contains("MLheAAAA"), "{sanitized}");
    }

    #[test]
    fn test_sanitize_redacts_oauth_signature() {
        let msg = r#"OAuth oauth_consumer_key="ck", oauth_signature="abc%3D", oauth_token="1-at""#;
        let sanitized = sanitize_error_message(msg);
        assert!(sanitized.contains(r#"oauth_signature="[REDACTED]""#), "{sanitized}");
        assert!(sanitized.contains(r#"oauth_token="[REDACTED]""#), "{sanitized}");
        assert!(!sanitized.contains("abc%3D"), "{sanitized}");
    }

    #[test]
    fn test_sanitize_redacts_access_tokens() {
        let msg = "token 370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb rejected";
        let sanitized = sanitize_error_message(msg);
        assert!(sanitized.contains("[REDACTED_TOKEN]"), "{sanitized}");
        assert!(!sanitized.contains("GmHxMAgY"), "{sanitized}");
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let long_msg = "é".repeat(400);
        let sanitized = sanitize_error_message(&long_msg);
        assert!(sanitized.ends_with("...[truncated]"));
        assert!(sanitized.len() < 520);
    }

    #[test]
    fn test_sanitize_passes_through_clean_messages() {
        let msg = "You are not allowed to create a Tweet with duplicate content.";
        assert_eq!(sanitize_error_message(msg), msg);
    }
}
