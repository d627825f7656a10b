//! The login redirect dance.
//!
//! ```text
//! Idle --commence--> AwaitingCallback --finish--> Complete
//!                                              \-> Failed
//! ```
//!
//! [`LoginFlow`] is stateless; the per-session [`FlowCorrelation`] carries the
//! referer and pending request token between the two legs. Callers must hold
//! the session's lock across [`LoginFlow::finish`] so that the pending token is
//! read and cleared exactly once.

use bitbucket_oauth_core::Result;
use bitbucket_oauth_provider::RequestToken;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

use crate::context::SecurityContext;
use crate::error::FlowError;
use crate::profile::UserProfile;
use crate::realm::{FINISH_LOGIN_PATH, Realm};

/// Where a session is in the login flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    AwaitingCallback,
    Complete,
    Failed,
}

/// Flow state stored in the interactive session between the two legs.
#[derive(Debug, Clone, Default)]
pub struct FlowCorrelation {
    state: FlowState,
    referer: Option<String>,
    pending: Option<RequestToken>,
}

impl FlowCorrelation {
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Returns the page the user started the login from.
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Returns the request token awaiting its callback.
    #[must_use]
    pub fn pending_request_token(&self) -> Option<&RequestToken> {
        self.pending.as_ref()
    }
}

/// How a callback concluded. Both variants end in a redirect.
#[derive(Debug)]
pub enum FinishOutcome {
    /// A principal was bound to the session.
    Complete {
        redirect: String,
        profile: UserProfile,
    },
    /// Nothing was bound.
    Failed {
        redirect: String,
        reason: Report<FlowError>,
    },
}

impl FinishOutcome {
    /// Returns where the user agent is sent next.
    #[must_use]
    pub fn redirect(&self) -> &str {
        match self {
            Self::Complete { redirect, .. } | Self::Failed { redirect, .. } => redirect,
        }
    }

    /// Returns true if a principal was bound.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Drives the login flow for a realm.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    realm: Arc<Realm>,
    root_url: Option<String>,
}

impl LoginFlow {
    /// Creates a flow for `realm`.
    ///
    /// `root_url` is the host's externally visible base URL; without it no
    /// callback URL can be built and every login fails to start.
    #[must_use]
    pub fn new(realm: Arc<Realm>, root_url: Option<String>) -> Self {
        let root_url = root_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Self { realm, root_url }
    }

    /// Returns the realm this flow logs into.
    #[must_use]
    pub fn realm(&self) -> &Arc<Realm> {
        &self.realm
    }

    /// The URL the provider sends the user back to.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::BaseUrlNotConfigured` without a root URL.
    pub fn callback_url(&self) -> Result<String, FlowError> {
        let root = self
            .root_url
            .as_deref()
            .ok_or(FlowError::BaseUrlNotConfigured)?;
        let root = root.strip_suffix('/').unwrap_or(root);
        Ok(format!("{root}/{FINISH_LOGIN_PATH}"))
    }

    /// Where failed or referer-less logins land.
    #[must_use]
    pub fn root_redirect(&self) -> String {
        match self.root_url.as_deref() {
            Some(root) if root.ends_with('/') => root.to_string(),
            Some(root) => format!("{root}/"),
            None => "/".to_string(),
        }
    }

    /// Starts a login: obtains a request token and returns the provider URL.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::BaseUrlNotConfigured` when no root URL is set, or
    /// `FlowError::RequestTokenFailed` when the provider cannot be reached.
    #[instrument(skip(self, correlation))]
    pub async fn commence(
        &self,
        correlation: &mut FlowCorrelation,
        referer: Option<&str>,
    ) -> Result<Url, FlowError> {
        let callback = self.callback_url()?;

        correlation.referer = referer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        correlation.pending = None;

        let provider = self.realm.provider();
        let request_token = match provider.create_request_token(&callback).await {
            Ok(token) => token,
            Err(e) => {
                correlation.state = FlowState::Failed;
                return Err(e.context(FlowError::RequestTokenFailed));
            }
        };

        let authorize = provider.create_authorization_url(&request_token);
        correlation.pending = Some(request_token);
        correlation.state = FlowState::AwaitingCallback;
        Ok(authorize)
    }

    /// Completes a login from the provider callback.
    ///
    /// Consumes the correlation state whatever happens. On success the
    /// resolved principal replaces whatever `context` held.
    #[instrument(skip_all)]
    pub async fn finish(
        &self,
        correlation: &mut FlowCorrelation,
        context: &mut SecurityContext,
        verifier: Option<&str>,
    ) -> FinishOutcome {
        let referer = correlation.referer.take();
        let pending = correlation.pending.take();
        let redirect = referer.unwrap_or_else(|| self.root_redirect());

        let outcome = match verifier.map(str::trim).filter(|v| !v.is_empty()) {
            None => {
                info!("callback without oauth_verifier");
                FinishOutcome::Failed {
                    redirect: self.root_redirect(),
                    reason: FlowError::MissingVerifier.into(),
                }
            }
            Some(verifier) => match self.complete(pending, context, verifier).await {
                Ok(profile) => FinishOutcome::Complete { redirect, profile },
                Err(reason) => {
                    warn!(error = %reason, "login failed");
                    FinishOutcome::Failed { redirect, reason }
                }
            },
        };

        correlation.state = if outcome.is_complete() {
            FlowState::Complete
        } else {
            FlowState::Failed
        };
        outcome
    }

    async fn complete(
        &self,
        pending: Option<RequestToken>,
        context: &mut SecurityContext,
        verifier: &str,
    ) -> Result<UserProfile, FlowError> {
        let request_token = pending.ok_or(FlowError::NoPendingRequest)?;

        let access_token = self
            .realm
            .provider()
            .exchange_code_for_access_token(verifier, &request_token)
            .await
            .map_err(|e| e.context(FlowError::ExchangeFailed))?;

        if access_token.is_empty() {
            return Err(FlowError::EmptyAccessToken.into());
        }

        let session = self
            .realm
            .resolver()
            .resolve_session(access_token)
            .await
            .map_err(|e| e.context(FlowError::IdentityRejected))?;

        let profile = session
            .profile()
            .cloned()
            .ok_or(FlowError::IdentityRejected)?;

        info!(username = %profile.username(), "login complete");
        context.bind(session.into());
        Ok(profile)
    }
}
