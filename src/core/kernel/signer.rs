use crate::core::config::VimondConfig;
use crate::core::errors::VimondError;
use base64::engine::general_purpose;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// RFC 1123 with a numeric zone, e.g. `Tue, 10 Nov 2009 23:00:00 +0000`.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

pub const DATE_HEADER: &str = "Date";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Result type for signing operations
pub type SignatureResult = Result<AuthorizationHeaders, VimondError>;

/// Headers produced by signing a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeaders {
    pub date: String,
    pub authorization: String,
}

impl AuthorizationHeaders {
    /// Header name/value pairs in the order they should be attached
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (DATE_HEADER, self.date.as_str()),
            (AUTHORIZATION_HEADER, self.authorization.as_str()),
        ]
        .into_iter()
    }
}

/// Signer trait for request authentication
///
/// Implementations must be pure: the same method, path and timestamp always
/// produce the same headers.
pub trait Signer: Send + Sync {
    /// Sign a request
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `path` - Unescaped request path, without query
    /// * `timestamp` - Moment the request is issued
    fn sign_request(&self, method: &str, path: &str, timestamp: DateTime<Utc>) -> SignatureResult;
}

/// HMAC-SHA1 signer producing `SUMO <apiKey>:<signature>` authorization.
pub struct SumoSigner {
    api_key: String,
    secret: Secret<String>,
}

impl SumoSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self {
            api_key,
            secret: Secret::new(secret),
        }
    }

    /// Build a signer when both the API key and secret are configured
    pub fn from_config(config: &VimondConfig) -> Option<Self> {
        config
            .has_credentials()
            .then(|| Self::new(config.api_key().to_string(), config.secret().to_string()))
    }
}

impl Signer for SumoSigner {
    fn sign_request(&self, method: &str, path: &str, timestamp: DateTime<Utc>) -> SignatureResult {
        authorization_headers(
            method,
            path,
            timestamp,
            &self.api_key,
            self.secret.expose_secret(),
        )
    }
}

/// Compute the `Date` and `Authorization` headers for a request.
///
/// The string to sign is `"<METHOD>\n<PATH>\n<DATE>"`.
pub fn authorization_headers(
    method: &str,
    path: &str,
    timestamp: DateTime<Utc>,
    api_key: &str,
    secret: &str,
) -> SignatureResult {
    let date = format_date(timestamp);
    let signature = compute_hmac_sha1(&format!("{}\n{}\n{}", method, path, date), secret)?;

    Ok(AuthorizationHeaders {
        date,
        authorization: format!("SUMO {}:{}", api_key, signature),
    })
}

pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

/// Base64 encoded HMAC-SHA1 of `message` keyed by `secret`
pub fn compute_hmac_sha1(message: &str, secret: &str) -> Result<String, VimondError> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| VimondError::InvalidInput(format!("Invalid signing secret: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
