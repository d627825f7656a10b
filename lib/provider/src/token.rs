//! OAuth credential and token types.
//!
//! Secrets are never printed: every `Debug` impl here redacts them, so the
//! types can flow through `tracing` fields without leaking.

use std::fmt;

/// The consumer key/secret pair registered with the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Creates a consumer credential pair.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns the consumer key.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the consumer secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Temporary credential issued at the start of a login attempt.
///
/// Lives only in the interactive session that began the flow and is
/// consumed by the access-token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestToken {
    token: String,
    secret: String,
}

impl RequestToken {
    /// Creates a request token.
    #[must_use]
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    /// Returns the public token value (sent as `oauth_token`).
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the token secret used as half of the signing key.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestToken")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Credential authorizing API calls on behalf of the authenticated user.
///
/// An exchange that succeeds at the HTTP level but carries no token fields
/// produces an empty access token; callers check [`AccessToken::is_empty`]
/// before treating it as a grant.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AccessToken {
    token: String,
    secret: String,
}

impl AccessToken {
    /// Creates an access token.
    #[must_use]
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    /// Returns an access token carrying no grant.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the public token value.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the token secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns true if the provider handed back no token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_empty() && self.secret.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Token fields of a form-encoded token endpoint response.
#[derive(Debug, Default)]
pub(crate) struct TokenResponse {
    pub(crate) token: Option<String>,
    pub(crate) secret: Option<String>,
}

impl TokenResponse {
    /// Reads `oauth_token` / `oauth_token_secret` out of an
    /// `application/x-www-form-urlencoded` body. Unknown keys are ignored.
    pub(crate) fn parse(body: &str) -> Self {
        let mut response = Self::default();
        for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
            match key.as_ref() {
                "oauth_token" => response.token = Some(value.into_owned()),
                "oauth_token_secret" => response.secret = Some(value.into_owned()),
                _ => {}
            }
        }
        response
    }
}
