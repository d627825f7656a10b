//! Scripted identity provider for unit tests.

use async_trait::async_trait;
use bitbucket_oauth_provider::{
    AccessToken, IdentityProvider, ProviderError, ProviderUser, RequestToken,
};
use rootcause::prelude::Report;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// How the fake answers the access-token exchange.
#[derive(Debug, Clone)]
pub(crate) enum Exchange {
    Grant(AccessToken),
    Empty,
    Reject,
}

#[derive(Debug)]
pub(crate) struct FakeProvider {
    pub(crate) profile: Option<ProviderUser>,
    pub(crate) teams: Vec<String>,
    pub(crate) exchange: Exchange,
    pub(crate) request_token_fails: bool,
    pub(crate) profile_fails: bool,
    pub(crate) directory: Vec<ProviderUser>,
    pub(crate) last_callback: Mutex<Option<String>>,
    pub(crate) exchanges: AtomicUsize,
    pub(crate) team_checks: AtomicUsize,
}

impl FakeProvider {
    /// A provider that knows `username` as a member of `teams`.
    pub(crate) fn member(username: &str, teams: &[&str]) -> Self {
        Self {
            profile: Some(
                ProviderUser::new(username).with_display_name(Some(format!("{username} (display)"))),
            ),
            teams: teams.iter().map(|t| (*t).to_string()).collect(),
            exchange: Exchange::Grant(AccessToken::new("at-1", "at-secret")),
            request_token_fails: false,
            profile_fails: false,
            directory: Vec::new(),
            last_callback: Mutex::new(None),
            exchanges: AtomicUsize::new(0),
            team_checks: AtomicUsize::new(0),
        }
    }

    pub(crate) fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub(crate) fn team_checks(&self) -> usize {
        self.team_checks.load(Ordering::SeqCst)
    }

    pub(crate) fn last_callback(&self) -> Option<String> {
        self.last_callback.lock().expect("lock").clone()
    }
}

fn unavailable(endpoint: &str) -> Report<ProviderError> {
    ProviderError::Unavailable {
        endpoint: endpoint.to_string(),
        reason: "scripted failure".to_string(),
    }
    .into()
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn create_request_token(
        &self,
        callback: &str,
    ) -> Result<RequestToken, Report<ProviderError>> {
        *self.last_callback.lock().expect("lock") = Some(callback.to_string());
        if self.request_token_fails {
            return Err(unavailable("request_token"));
        }
        Ok(RequestToken::new("rt-1", "rt-secret"))
    }

    fn create_authorization_url(&self, request_token: &RequestToken) -> Url {
        let mut url = Url::parse("https://provider.test/authenticate").expect("valid url");
        url.query_pairs_mut()
            .append_pair("oauth_token", request_token.token());
        url
    }

    async fn exchange_code_for_access_token(
        &self,
        _code: &str,
        _request_token: &RequestToken,
    ) -> Result<AccessToken, Report<ProviderError>> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        match &self.exchange {
            Exchange::Grant(token) => Ok(token.clone()),
            Exchange::Empty => Ok(AccessToken::empty()),
            Exchange::Reject => Err(ProviderError::InvalidGrant {
                reason: "scripted rejection".to_string(),
            }
            .into()),
        }
    }

    async fn fetch_authenticated_user(
        &self,
        _access_token: &AccessToken,
    ) -> Result<Option<ProviderUser>, Report<ProviderError>> {
        if self.profile_fails {
            return Err(unavailable("user"));
        }
        Ok(self.profile.clone())
    }

    async fn is_team_member(
        &self,
        _access_token: &AccessToken,
        team_name: &str,
    ) -> Result<bool, Report<ProviderError>> {
        self.team_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.teams.iter().any(|t| t == team_name))
    }

    async fn fetch_user_by_username(&self, username: &str) -> Option<ProviderUser> {
        self.directory
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}
