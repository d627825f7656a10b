//! Turns an access token into an authorization decision.
//!
//! "No profile" and "profile outside the required team" produce the same
//! result for callers; only the logs tell them apart.

use bitbucket_oauth_provider::{AccessToken, IdentityProvider};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::AuthenticationError;
use crate::profile::UserProfile;
use crate::session::SessionAuthentication;

/// Resolves access tokens against the provider and the configured team.
#[derive(Clone)]
pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    team_name: Option<String>,
}

impl IdentityResolver {
    /// Creates a resolver that admits members of `team_name`.
    ///
    /// With no team configured nobody is admitted.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, team_name: Option<String>) -> Self {
        Self {
            provider,
            team_name,
        }
    }

    /// Fetches the profile behind `access_token` and checks team membership.
    ///
    /// Returns `Ok(None)` when there is no profile or the team check fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::ProviderFailure` when a provider call fails.
    #[instrument(skip(self, access_token))]
    pub async fn resolve_user(
        &self,
        access_token: &AccessToken,
    ) -> Result<Option<UserProfile>, Report<AuthenticationError>> {
        let Some(user) = self
            .provider
            .fetch_authenticated_user(access_token)
            .await
            .map_err(|e| {
                e.context(AuthenticationError::ProviderFailure {
                    step: "profile fetch",
                })
            })?
        else {
            info!("access token resolved to no profile");
            return Ok(None);
        };

        let Some(team_name) = self.team_name.as_deref() else {
            warn!(username = %user.username, "no team configured; refusing login");
            return Ok(None);
        };

        let member = self
            .provider
            .is_team_member(access_token, team_name)
            .await
            .map_err(|e| {
                e.context(AuthenticationError::ProviderFailure {
                    step: "team membership check",
                })
            })?;

        if !member {
            info!(username = %user.username, team = %team_name, "user is not a team member");
            return Ok(None);
        }

        Ok(Some(UserProfile::from_provider(user)))
    }

    /// Resolves `access_token` into a bindable session principal.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::Unauthenticated` when the token does not
    /// resolve to a team member, or `ProviderFailure` when the provider fails.
    pub async fn resolve_session(
        &self,
        access_token: AccessToken,
    ) -> Result<SessionAuthentication, Report<AuthenticationError>> {
        match self.resolve_user(&access_token).await? {
            Some(profile) => Ok(SessionAuthentication::new(
                access_token,
                profile,
                self.team_name.clone(),
            )),
            None => Err(AuthenticationError::Unauthenticated.into()),
        }
    }
}
