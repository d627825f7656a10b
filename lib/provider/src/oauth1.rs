//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! Only what the login handshake needs: protocol parameters in the
//! `Authorization` header, query parameters folded into the signature base
//! string, no form-body parameters.

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Percent-encodes a value the way OAuth 1.0a requires.
#[must_use]
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// The `oauth_*` protocol parameters of one request.
#[derive(Debug, Clone)]
pub struct ProtocolParams {
    entries: Vec<(&'static str, String)>,
}

impl ProtocolParams {
    /// Creates the mandatory parameter set with an explicit nonce and timestamp.
    #[must_use]
    pub fn new(consumer_key: &str, nonce: &str, timestamp: i64) -> Self {
        Self {
            entries: vec![
                ("oauth_consumer_key", consumer_key.to_string()),
                ("oauth_nonce", nonce.to_string()),
                ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
                ("oauth_timestamp", timestamp.to_string()),
                ("oauth_version", VERSION.to_string()),
            ],
        }
    }

    /// Creates the mandatory parameter set with a random nonce and the current time.
    #[must_use]
    pub fn fresh(consumer_key: &str) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self::new(consumer_key, &nonce, chrono::Utc::now().timestamp())
    }

    /// Adds `oauth_token`.
    #[must_use]
    pub fn with_token(self, token: &str) -> Self {
        self.with("oauth_token", token)
    }

    /// Adds `oauth_callback`.
    #[must_use]
    pub fn with_callback(self, callback: &str) -> Self {
        self.with("oauth_callback", callback)
    }

    /// Adds `oauth_verifier`.
    #[must_use]
    pub fn with_verifier(self, verifier: &str) -> Self {
        self.with("oauth_verifier", verifier)
    }

    fn with(mut self, key: &'static str, value: &str) -> Self {
        self.entries.push((key, value.to_string()));
        self
    }

    /// Builds the signature base string for `method` and `url`.
    #[must_use]
    pub fn signature_base_string(&self, method: &str, url: &Url) -> String {
        let mut pairs: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .chain(
                url.query_pairs()
                    .map(|(k, v)| (encode(&k), encode(&v))),
            )
            .collect();
        pairs.sort();

        let normalized_params = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(&base_string_uri(url)),
            encode(&normalized_params)
        )
    }

    /// Computes the HMAC-SHA1 signature for `method` and `url`.
    #[must_use]
    pub fn signature(
        &self,
        method: &str,
        url: &Url,
        consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> String {
        let key = format!(
            "{}&{}",
            encode(consumer_secret),
            encode(token_secret.unwrap_or_default())
        );
        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
        mac.update(self.signature_base_string(method, url).as_bytes());
        base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Signs the request and renders the `Authorization` header value.
    #[must_use]
    pub fn authorization_header(
        &self,
        method: &str,
        url: &Url,
        consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> String {
        let signature = self.signature(method, url, consumer_secret, token_secret);
        let mut fields: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .collect();
        fields.sort();

        let rendered = fields
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {rendered}")
    }
}

/// Scheme and host lowercased, default ports dropped, no query or fragment.
fn base_string_uri(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}{}", url.path()),
        None => format!("{scheme}://{host}{}", url.path()),
    }
}
