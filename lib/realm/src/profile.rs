//! Normalized identity of a provider user.

use bitbucket_oauth_provider::ProviderUser;
use serde::{Deserialize, Serialize};

use crate::authority::AuthoritySet;

/// A user identity as the realm hands it to the host.
///
/// Recomputed on every authentication; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    username: String,
    display_name: Option<String>,
    authorities: AuthoritySet,
}

impl UserProfile {
    /// Creates a profile with explicit authorities.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        display_name: Option<String>,
        authorities: AuthoritySet,
    ) -> Self {
        Self {
            username: username.into(),
            display_name,
            authorities,
        }
    }

    /// Maps a provider record, granting the standard authenticated authority.
    #[must_use]
    pub fn from_provider(user: ProviderUser) -> Self {
        Self::new(user.username, user.display_name, AuthoritySet::authenticated())
    }

    /// Returns the provider username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the display name, if the provider supplied one.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the display name, falling back to the username.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.display_name().unwrap_or(&self.username)
    }

    /// Returns the granted authorities.
    #[must_use]
    pub fn authorities(&self) -> &AuthoritySet {
        &self.authorities
    }
}
