//! The long-lived realm the host authenticates through.

use bitbucket_oauth_core::Result;
use bitbucket_oauth_provider::{BitbucketClient, IdentityProvider, ProviderConfig, ProviderError};
use rootcause::prelude::Report;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::context::{Authentication, SecurityContext};
use crate::credentials::Credentials;
use crate::error::RealmError;
use crate::profile::UserProfile;
use crate::resolver::IdentityResolver;
use crate::session::SessionAuthentication;

/// Path, relative to the host root, where a login starts.
pub const LOGIN_PATH: &str = "securityRealm/commenceLogin";

/// Path, relative to the host root, the provider redirects back to.
pub const FINISH_LOGIN_PATH: &str = "securityRealm/finishLogin";

/// Configured Bitbucket realm.
///
/// Holds the operator credentials and the provider client built from them.
/// Both are read-only for the realm's lifetime; reconfiguring means building
/// a new `Realm`.
#[derive(Clone)]
pub struct Realm {
    credentials: Credentials,
    provider: Arc<dyn IdentityProvider>,
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Realm {
    /// Creates a realm talking to an arbitrary provider implementation.
    #[must_use]
    pub fn new(credentials: Credentials, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            credentials,
            provider,
        }
    }

    /// Creates a realm backed by a [`BitbucketClient`].
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the endpoints are invalid.
    pub fn connect(
        credentials: Credentials,
        config: &ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let client = BitbucketClient::new(credentials.client_credentials(), config)?;
        Ok(Self::new(credentials, Arc::new(client)))
    }

    /// Returns the configured credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the provider client.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Returns a resolver bound to the configured team.
    #[must_use]
    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(
            Arc::clone(&self.provider),
            self.credentials.team_name().map(str::to_string),
        )
    }

    /// Accepts an authentication produced by this realm's login flow.
    ///
    /// # Errors
    ///
    /// Returns `RealmError::UnsupportedCredentialType` for anything else, and
    /// `RealmError::UnresolvedIdentity` for a session whose identity was never
    /// resolved.
    pub fn authenticate(
        &self,
        authentication: Authentication,
    ) -> Result<SessionAuthentication, RealmError> {
        match authentication {
            Authentication::Session(session) if session.is_authenticated() => Ok(*session),
            Authentication::Session(_) => Err(RealmError::UnresolvedIdentity.into()),
            other => Err(RealmError::UnsupportedCredentialType {
                kind: other.kind().to_string(),
            }
            .into()),
        }
    }

    /// Looks up a user by provider username.
    ///
    /// Only answers inside a session established through this realm.
    ///
    /// # Errors
    ///
    /// Returns `RealmError::NoSuchUser` if the current principal is not a
    /// realm session or the provider knows no such user.
    #[instrument(skip(self, context))]
    pub async fn load_user_by_username(
        &self,
        context: &SecurityContext,
        username: &str,
    ) -> Result<UserProfile, RealmError> {
        let no_such_user = || -> Report<RealmError> {
            RealmError::NoSuchUser {
                username: username.to_string(),
            }
            .into()
        };

        if context.session().is_none() {
            debug!("lookup outside a realm session");
            return Err(no_such_user());
        }

        self.provider
            .fetch_user_by_username(username)
            .await
            .map(UserProfile::from_provider)
            .ok_or_else(no_such_user)
    }

    /// Groups are not modelled; every lookup fails.
    ///
    /// # Errors
    ///
    /// Always returns `RealmError::NoSuchGroup`.
    pub fn load_group_by_groupname(&self, group: &str) -> Result<Infallible, RealmError> {
        Err(RealmError::NoSuchGroup {
            group: group.to_string(),
        }
        .into())
    }

    /// Users only appear by logging in.
    #[must_use]
    pub fn allows_self_signup(&self) -> bool {
        false
    }

    /// Host-relative URL that starts a login.
    #[must_use]
    pub fn login_url(&self) -> &'static str {
        LOGIN_PATH
    }
}
