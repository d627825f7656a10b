//! In-memory directory of host users.
//!
//! Records are keyed by provider username and only ever created by a
//! successful login.

use bitbucket_oauth_realm::{User, UserProfile};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Host user records.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or updates the record for a freshly logged-in profile.
    pub async fn record_login(&self, profile: &UserProfile) -> User {
        let mut users = self.users.write().await;
        let user = users
            .entry(profile.username().to_string())
            .or_insert_with(|| {
                info!(username = %profile.username(), "creating user record");
                User::new(profile.username())
            });
        user.record_login(profile);
        user.clone()
    }

    /// Returns the record for `username`.
    pub async fn find(&self, username: &str) -> Option<User> {
        self.users.read().await.get(username).cloned()
    }

    /// Returns the number of known users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitbucket_oauth_realm::AuthoritySet;

    fn profile(display_name: &str) -> UserProfile {
        UserProfile::new(
            "alice",
            Some(display_name.to_string()),
            AuthoritySet::authenticated(),
        )
    }

    #[tokio::test]
    async fn login_creates_then_updates() {
        let directory = UserDirectory::new();

        let created = directory.record_login(&profile("Alice")).await;
        let updated = directory.record_login(&profile("Alice Liddell")).await;

        assert_eq!(directory.len().await, 1);
        assert_eq!(created.created_at(), updated.created_at());
        assert_eq!(
            directory
                .find("alice")
                .await
                .and_then(|u| u.display_name().map(str::to_string)),
            Some("Alice Liddell".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_user_is_absent() {
        assert!(UserDirectory::new().find("ghost").await.is_none());
    }
}
