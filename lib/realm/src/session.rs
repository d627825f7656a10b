//! The authenticated principal bound to an interactive session.
//!
//! A `SessionAuthentication` is a plain value. Producing one from an access
//! token is the job of [`IdentityResolver::resolve_session`]; this module does
//! no I/O.
//!
//! [`IdentityResolver::resolve_session`]: crate::resolver::IdentityResolver::resolve_session

use bitbucket_oauth_provider::AccessToken;

use crate::authority::AuthoritySet;
use crate::profile::UserProfile;

/// Access token plus the identity it resolved to.
///
/// Immutable after construction. A session's principal is replaced wholesale
/// on each login, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAuthentication {
    access_token: AccessToken,
    profile: Option<UserProfile>,
    team_name: Option<String>,
    authorities: AuthoritySet,
}

impl SessionAuthentication {
    /// Creates an authenticated principal from a resolved profile.
    #[must_use]
    pub fn new(access_token: AccessToken, profile: UserProfile, team_name: Option<String>) -> Self {
        let authorities = profile.authorities().clone();
        Self {
            access_token,
            profile: Some(profile),
            team_name,
            authorities,
        }
    }

    /// Creates a principal whose identity could not be resolved.
    ///
    /// Such a value reports no name and no authorities and must never be
    /// bound to a session.
    #[must_use]
    pub fn unauthenticated(access_token: AccessToken, team_name: Option<String>) -> Self {
        Self {
            access_token,
            profile: None,
            team_name,
            authorities: AuthoritySet::none(),
        }
    }

    /// Returns true if the identity was resolved (including the team check).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    /// Returns the granted authorities; empty when unauthenticated.
    #[must_use]
    pub fn authorities(&self) -> &AuthoritySet {
        &self.authorities
    }

    /// Returns the resolved username; `None` when unauthenticated.
    #[must_use]
    pub fn principal_name(&self) -> Option<&str> {
        self.profile.as_ref().map(UserProfile::username)
    }

    /// Returns the resolved profile.
    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Returns the access token the identity was resolved from.
    #[must_use]
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the team the identity was checked against.
    #[must_use]
    pub fn team_name(&self) -> Option<&str> {
        self.team_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::Authority;

    fn token() -> AccessToken {
        AccessToken::new("at-1", "at-secret")
    }

    #[test]
    fn exposes_exactly_profile_authorities() {
        let authorities: AuthoritySet = [Authority::new("A"), Authority::new("B")]
            .into_iter()
            .collect();
        let profile = UserProfile::new("alice", None, authorities.clone());

        let auth = SessionAuthentication::new(token(), profile, Some("myteam".to_string()));

        assert!(auth.is_authenticated());
        assert_eq!(auth.authorities(), &authorities);
        assert_eq!(auth.principal_name(), Some("alice"));
        assert_eq!(auth.team_name(), Some("myteam"));
    }

    #[test]
    fn unauthenticated_has_nothing() {
        let auth = SessionAuthentication::unauthenticated(token(), Some("myteam".to_string()));

        assert!(!auth.is_authenticated());
        assert!(auth.authorities().is_empty());
        assert_eq!(auth.principal_name(), None);
        assert!(auth.profile().is_none());
        assert_eq!(auth.access_token(), &token());
    }
}
