//! Host-side user record.
//!
//! The host keeps one record per username that has ever logged in through
//! the realm. The realm never creates identities on its own initiative (no
//! self-signup); records only appear as a side effect of a successful login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;

/// A user known to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider username; the record's key.
    username: String,
    /// Name shown in the host UI, refreshed from the provider on each login.
    display_name: Option<String>,
    /// When the record was created.
    created_at: DateTime<Utc>,
    /// When the record was last updated.
    updated_at: DateTime<Utc>,
    /// When the user last completed a login.
    last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a record for `username` with no display name.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            display_name: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns when the record was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the record was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the user last logged in.
    #[must_use]
    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    /// Sets the display name.
    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
        self.updated_at = Utc::now();
    }

    /// Applies a freshly resolved profile after a successful login.
    pub fn record_login(&mut self, profile: &UserProfile) {
        self.set_display_name(Some(profile.full_name().to_string()));
        self.last_login_at = Some(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::AuthoritySet;

    #[test]
    fn new_user_has_no_display_name() {
        let user = User::new("alice");
        assert_eq!(user.username(), "alice");
        assert!(user.display_name().is_none());
        assert!(user.last_login_at().is_none());
        assert_eq!(user.created_at(), user.updated_at());
    }

    #[test]
    fn set_display_name_updates_timestamp() {
        let mut user = User::new("alice");
        let original_updated_at = user.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(1));
        user.set_display_name(Some("Alice".to_string()));

        assert_eq!(user.display_name(), Some("Alice"));
        assert!(user.updated_at() > original_updated_at);
    }

    #[test]
    fn record_login_takes_profile_name() {
        let mut user = User::new("alice");
        let profile = UserProfile::new(
            "alice",
            Some("Alice Liddell".to_string()),
            AuthoritySet::authenticated(),
        );

        user.record_login(&profile);

        assert_eq!(user.display_name(), Some("Alice Liddell"));
        assert_eq!(user.last_login_at(), Some(user.updated_at()));
    }
}
