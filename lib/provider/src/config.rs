//! Identity provider endpoint configuration.
//!
//! Every field has a default pointing at Bitbucket, so an empty
//! configuration source yields a working provider. Overrides exist mainly
//! for self-hosted proxies and for tests that stand up a mock provider.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProviderError;

/// Endpoints and transport settings for the OAuth identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Endpoint issuing temporary request tokens.
    #[serde(default = "default_request_token_url")]
    request_token_url: String,
    /// Page the user agent is sent to for authorizing the request token.
    #[serde(default = "default_authorize_url")]
    authorize_url: String,
    /// Endpoint exchanging request token + verifier for an access token.
    #[serde(default = "default_access_token_url")]
    access_token_url: String,
    /// Base of the REST API (`user`, `teams`, `users/{name}` live below it).
    #[serde(default = "default_api_base_url")]
    api_base_url: String,
    /// Per-request timeout for provider calls, in seconds.
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

fn default_request_token_url() -> String {
    "https://bitbucket.org/api/1.0/oauth/request_token".to_string()
}

fn default_authorize_url() -> String {
    "https://bitbucket.org/api/1.0/oauth/authenticate".to_string()
}

fn default_access_token_url() -> String {
    "https://bitbucket.org/api/1.0/oauth/access_token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.bitbucket.org/2.0/".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_token_url: default_request_token_url(),
            authorize_url: default_authorize_url(),
            access_token_url: default_access_token_url(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ProviderConfig {
    /// Points every endpoint at a single origin, using Bitbucket's paths.
    ///
    /// Useful for a mock provider: `http://127.0.0.1:4567` becomes
    /// `http://127.0.0.1:4567/api/1.0/oauth/request_token` and so on, with the
    /// REST API under `/2.0/`.
    #[must_use]
    pub fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            request_token_url: format!("{origin}/api/1.0/oauth/request_token"),
            authorize_url: format!("{origin}/api/1.0/oauth/authenticate"),
            access_token_url: format!("{origin}/api/1.0/oauth/access_token"),
            api_base_url: format!("{origin}/2.0/"),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Returns the request-token endpoint.
    #[must_use]
    pub fn request_token_url(&self) -> &str {
        &self.request_token_url
    }

    /// Returns the authorization page URL.
    #[must_use]
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    /// Returns the access-token endpoint.
    #[must_use]
    pub fn access_token_url(&self) -> &str {
        &self.access_token_url
    }

    /// Returns the REST API base URL.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Returns the per-request timeout in seconds.
    #[must_use]
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Parses every configured URL.
    ///
    /// The API base always ends up with a trailing slash so relative joins
    /// append to it instead of replacing its last segment.
    pub(crate) fn parse(&self) -> Result<ParsedEndpoints, ProviderError> {
        let api_base = if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        };

        Ok(ParsedEndpoints {
            request_token: parse_url("request_token_url", &self.request_token_url)?,
            authorize: parse_url("authorize_url", &self.authorize_url)?,
            access_token: parse_url("access_token_url", &self.access_token_url)?,
            api_base: parse_url("api_base_url", &api_base)?,
        })
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ProviderError> {
    Url::parse(value).map_err(|e| ProviderError::Configuration {
        reason: format!("invalid {field} '{value}': {e}"),
    })
}

/// Validated endpoint URLs.
#[derive(Debug, Clone)]
pub(crate) struct ParsedEndpoints {
    pub(crate) request_token: Url,
    pub(crate) authorize: Url,
    pub(crate) access_token: Url,
    pub(crate) api_base: Url,
}
