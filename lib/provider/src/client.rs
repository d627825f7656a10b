//! Identity provider client.
//!
//! [`IdentityProvider`] is the seam the realm talks through; [`BitbucketClient`]
//! is the reqwest-backed implementation that speaks OAuth 1.0a to Bitbucket.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{ParsedEndpoints, ProviderConfig};
use crate::error::ProviderError;
use crate::oauth1::ProtocolParams;
use crate::profile::{ProviderUser, parse_team_names, parse_user};
use crate::token::{AccessToken, ClientCredentials, RequestToken, TokenResponse};

/// Operations the login flow needs from the identity provider.
///
/// Everything except [`IdentityProvider::create_authorization_url`] performs
/// network I/O. No implementation keeps per-user state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtains a request token whose authorization will redirect to `callback`.
    async fn create_request_token(
        &self,
        callback: &str,
    ) -> Result<RequestToken, Report<ProviderError>>;

    /// Builds the provider page the user agent is sent to. Pure.
    fn create_authorization_url(&self, request_token: &RequestToken) -> Url;

    /// Trades a request token plus the one-time verifier for an access token.
    async fn exchange_code_for_access_token(
        &self,
        code: &str,
        request_token: &RequestToken,
    ) -> Result<AccessToken, Report<ProviderError>>;

    /// Fetches the profile behind `access_token`, `None` if there is none.
    async fn fetch_authenticated_user(
        &self,
        access_token: &AccessToken,
    ) -> Result<Option<ProviderUser>, Report<ProviderError>>;

    /// Returns true if one of the user's teams is exactly `team_name`.
    async fn is_team_member(
        &self,
        access_token: &AccessToken,
        team_name: &str,
    ) -> Result<bool, Report<ProviderError>>;

    /// Looks up a public profile. Every failure is logged and yields `None`.
    async fn fetch_user_by_username(&self, username: &str) -> Option<ProviderUser>;
}

/// OAuth 1.0a client for Bitbucket.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: reqwest::Client,
    credentials: ClientCredentials,
    endpoints: ParsedEndpoints,
}

impl BitbucketClient {
    /// Creates a client for the given consumer credentials and endpoints.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if an endpoint URL is invalid or
    /// the HTTP client cannot be built.
    pub fn new(
        credentials: ClientCredentials,
        config: &ProviderConfig,
    ) -> Result<Self, Report<ProviderError>> {
        let endpoints = config.parse()?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()
            .map_err(|e| ProviderError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            credentials,
            endpoints,
        })
    }

    /// Returns the consumer credentials this client signs with.
    #[must_use]
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.endpoints.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::Configuration {
                reason: format!("API base '{}' cannot carry a path", self.endpoints.api_base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        authorization: Option<String>,
    ) -> Result<(StatusCode, String), ProviderError> {
        let mut request = self.http.request(method, url.clone());
        if let Some(header) = authorization {
            request = request.header(AUTHORIZATION, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| unavailable(url, e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| unavailable(url, format!("failed to read body: {e}")))?;

        debug!(endpoint = %endpoint(url), %status, "provider responded");
        Ok((status, body))
    }

    async fn send_signed(
        &self,
        method: Method,
        url: &Url,
        params: ProtocolParams,
        token_secret: Option<&str>,
    ) -> Result<(StatusCode, String), ProviderError> {
        let header = params.authorization_header(
            method.as_str(),
            url,
            self.credentials.client_secret(),
            token_secret,
        );
        self.send(method, url, Some(header)).await
    }

    async fn get_with_token(
        &self,
        url: &Url,
        access_token: &AccessToken,
    ) -> Result<(StatusCode, String), ProviderError> {
        let params =
            ProtocolParams::fresh(self.credentials.client_id()).with_token(access_token.token());
        self.send_signed(Method::GET, url, params, Some(access_token.secret()))
            .await
    }
}

#[async_trait]
impl IdentityProvider for BitbucketClient {
    #[instrument(skip(self))]
    async fn create_request_token(
        &self,
        callback: &str,
    ) -> Result<RequestToken, Report<ProviderError>> {
        let url = &self.endpoints.request_token;
        let params = ProtocolParams::fresh(self.credentials.client_id()).with_callback(callback);
        let (status, body) = self.send_signed(Method::POST, url, params, None).await?;

        if !status.is_success() {
            return Err(unavailable(url, format!("HTTP {status}")).into());
        }

        match TokenResponse::parse(&body) {
            TokenResponse {
                token: Some(token),
                secret,
            } if !token.is_empty() => Ok(RequestToken::new(token, secret.unwrap_or_default())),
            _ => Err(ProviderError::MalformedResponse {
                endpoint: endpoint(url),
                reason: "response carries no oauth_token".to_string(),
            }
            .into()),
        }
    }

    fn create_authorization_url(&self, request_token: &RequestToken) -> Url {
        let mut url = self.endpoints.authorize.clone();
        url.query_pairs_mut()
            .append_pair("oauth_token", request_token.token());
        url
    }

    #[instrument(skip(self, code, request_token))]
    async fn exchange_code_for_access_token(
        &self,
        code: &str,
        request_token: &RequestToken,
    ) -> Result<AccessToken, Report<ProviderError>> {
        let url = &self.endpoints.access_token;
        let params = ProtocolParams::fresh(self.credentials.client_id())
            .with_token(request_token.token())
            .with_verifier(code);
        let (status, body) = self
            .send_signed(Method::POST, url, params, Some(request_token.secret()))
            .await?;

        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(ProviderError::InvalidGrant {
                reason: format!("HTTP {status}"),
            }
            .into());
        }
        if !status.is_success() {
            return Err(unavailable(url, format!("HTTP {status}")).into());
        }

        let parsed = TokenResponse::parse(&body);
        Ok(match parsed.token {
            Some(token) => AccessToken::new(token, parsed.secret.unwrap_or_default()),
            None => AccessToken::empty(),
        })
    }

    #[instrument(skip(self, access_token))]
    async fn fetch_authenticated_user(
        &self,
        access_token: &AccessToken,
    ) -> Result<Option<ProviderUser>, Report<ProviderError>> {
        let url = self.api_url(&["user"])?;
        let (status, body) = self.get_with_token(&url, access_token).await?;

        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            debug!(%status, "provider returned no profile for token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(unavailable(&url, format!("HTTP {status}")).into());
        }

        parse_user(&body).map_err(|e| {
            ProviderError::MalformedResponse {
                endpoint: endpoint(&url),
                reason: e.to_string(),
            }
            .into()
        })
    }

    #[instrument(skip(self, access_token))]
    async fn is_team_member(
        &self,
        access_token: &AccessToken,
        team_name: &str,
    ) -> Result<bool, Report<ProviderError>> {
        let url = self.api_url(&["teams"])?;
        let (status, body) = self.get_with_token(&url, access_token).await?;

        if !status.is_success() {
            return Err(unavailable(&url, format!("HTTP {status}")).into());
        }

        let teams = parse_team_names(&body).map_err(|e| ProviderError::MalformedResponse {
            endpoint: endpoint(&url),
            reason: e.to_string(),
        })?;
        let member = teams.iter().any(|team| team == team_name);
        debug!(team_count = teams.len(), member, "team membership checked");
        Ok(member)
    }

    #[instrument(skip(self))]
    async fn fetch_user_by_username(&self, username: &str) -> Option<ProviderUser> {
        let url = match self.api_url(&["users", username]) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build user lookup URL");
                return None;
            }
        };

        let (status, body) = match self.send(Method::GET, &url, None).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "user lookup failed");
                return None;
            }
        };

        if !status.is_success() {
            debug!(%status, "user lookup returned no profile");
            return None;
        }

        match parse_user(&body) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "user lookup returned an unreadable profile");
                None
            }
        }
    }
}

/// Endpoint rendering for errors and logs: no query string.
fn endpoint(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn unavailable(url: &Url, reason: String) -> ProviderError {
    ProviderError::Unavailable {
        endpoint: endpoint(url),
        reason,
    }
}
