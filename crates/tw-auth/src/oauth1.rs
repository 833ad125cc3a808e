//! One-legged OAuth 1.0a request signing (HMAC-SHA1).
//!
//! The signature covers the HTTP method, the base URL (no query string)
//! and every query and form-encoded body parameter. Multipart and JSON
//! bodies are not part of the signature base string.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;
use sha1::Sha1;

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};

/// RFC 3986 unreserved characters (`ALPHA / DIGIT / "-" / "." / "_" / "~"`)
/// are the only bytes left unencoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// OAuth 1.0a signer holding a complete set of keys.
///
/// Every call to [`sign`](Self::sign) uses a fresh timestamp and nonce,
/// so one signer can be shared across concurrent requests.
#[derive(Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_token_secret: String,
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

impl OAuth1Signer {
    /// Build a signer from credentials.
    ///
    /// Fails with `MissingCredential` if any OAuth 1.0a field is absent.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        let keys = credentials.oauth1_keys()?;
        Ok(Self {
            consumer_key: keys.consumer_key.to_string(),
            consumer_secret: keys.consumer_secret.to_string(),
            access_token: keys.access_token.to_string(),
            access_token_secret: keys.access_token_secret.to_string(),
        })
    }

    /// Generate the `Authorization` header value for a request.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, ...)
    /// * `url` - Request URL; any query string in it is signed too
    /// * `params` - Query parameters and form body parameters
    pub fn sign(&self, method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let nonce = generate_nonce();
        self.sign_with(method, url, params, &timestamp, &nonce)
    }

    /// Sign with an explicit timestamp and nonce.
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        timestamp: &str,
        nonce: &str,
    ) -> Result<String> {
        let parsed = url::Url::parse(url)?;

        let mut oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.access_token.clone()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];

        let mut all_params: Vec<(String, String)> = oauth_params
            .iter()
            .cloned()
            .chain(parsed.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
            .chain(params.iter().cloned())
            .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
            .collect();
        all_params.sort();

        let param_string = all_params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(&base_url(&parsed)),
            percent_encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.access_token_secret)
        );

        let signature = hmac_sha1(&signing_key, &base_string)?;
        oauth_params.push(("oauth_signature".to_string(), signature));

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

/// Percent-encode a string the way OAuth 1.0a requires (RFC 3986).
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// `scheme://host[:port]/path` with default ports dropped.
fn base_url(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hmac_sha1(key: &str, data: &str) -> Result<String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::new(ErrorKind::Signing(e.to_string())))?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Key material from Twitter's "Creating a signature" walkthrough.
    fn documented_signer() -> OAuth1Signer {
        let creds = Credentials::new(
            "bearer",
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        OAuth1Signer::from_credentials(&creds).unwrap()
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("test-value_123.txt"), "test-value_123.txt");
        assert_eq!(percent_encode("~tilde"), "~tilde");
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();

        assert_ne!(nonce1, nonce2);
        assert_eq!(nonce1.len(), 32);
        assert!(nonce1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_documented_signature() {
        let signer = documented_signer();
        let params = vec![
            ("include_entities".to_string(), "true".to_string()),
            (
                "status".to_string(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".to_string(),
            ),
        ];

        let header = signer
            .sign_with(
                "post",
                "https://api.twitter.com/1.1/statuses/update.json",
                &params,
                "1318622958",
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            )
            .unwrap();

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(!header.contains("status="));
    }

    #[test]
    fn test_query_string_in_url_is_signed() {
        let signer = documented_signer();
        let params = vec![
            ("include_entities".to_string(), "true".to_string()),
            (
                "status".to_string(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".to_string(),
            ),
        ];

        let split = signer
            .sign_with(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
                &params[1..],
                "1318622958",
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            )
            .unwrap();

        assert!(split.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let signer = documented_signer();
        let a = signer.sign("GET", "https://api.twitter.com/2/users/me", &[]).unwrap();
        let b = signer.sign("GET", "https://api.twitter.com/2/users/me", &[]).unwrap();
        assert_ne!(a, b);
        assert!(a.contains("oauth_nonce="));
        assert!(a.contains("oauth_timestamp="));
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let err = OAuth1Signer::from_credentials(&Credentials::bearer("b")).unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_base_url_drops_default_port_and_query() {
        let url = url::Url::parse("HTTPS://API.Twitter.com:443/2/tweets?x=1").unwrap();
        assert_eq!(base_url(&url), "https://api.twitter.com/2/tweets");

        let url = url::Url::parse("http://localhost:8080/2/tweets").unwrap();
        assert_eq!(base_url(&url), "http://localhost:8080/2/tweets");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", documented_signer());
        assert!(!debug.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(debug.contains("[REDACTED]"));
    }
}
