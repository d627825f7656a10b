//! Operator-supplied OAuth credentials for the realm.
//!
//! Values are normalized on the way in: surrounding whitespace is trimmed and
//! a blank team name counts as "not configured".

use bitbucket_oauth_provider::ClientCredentials;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client id, client secret and the team whose members may log in.
///
/// Immutable once handed to a [`Realm`](crate::Realm); editing produces a new
/// value through the `with_*` methods.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CredentialFields", into = "CredentialFields")]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    team_name: Option<String>,
}

/// Wire shape of [`Credentials`], normalized by `From`.
#[derive(Serialize, Deserialize)]
struct CredentialFields {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    team_name: Option<String>,
}

impl From<CredentialFields> for Credentials {
    fn from(fields: CredentialFields) -> Self {
        Self::new(fields.client_id, fields.client_secret, fields.team_name)
    }
}

impl From<Credentials> for CredentialFields {
    fn from(credentials: Credentials) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            team_name: credentials.team_name,
        }
    }
}

fn fix_empty_and_trim(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Credentials {
    /// Creates normalized credentials.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        team_name: Option<String>,
    ) -> Self {
        Self {
            client_id: fix_empty_and_trim(client_id.into()).unwrap_or_default(),
            client_secret: fix_empty_and_trim(client_secret.into()).unwrap_or_default(),
            team_name: team_name.and_then(fix_empty_and_trim),
        }
    }

    /// Returns the OAuth consumer key.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth consumer secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the team whose members may log in, if configured.
    #[must_use]
    pub fn team_name(&self) -> Option<&str> {
        self.team_name.as_deref()
    }

    /// Returns a copy with a different client id.
    #[must_use]
    pub fn with_client_id(self, client_id: impl Into<String>) -> Self {
        Self::new(client_id, self.client_secret, self.team_name)
    }

    /// Returns a copy with a different client secret.
    #[must_use]
    pub fn with_client_secret(self, client_secret: impl Into<String>) -> Self {
        Self::new(self.client_id, client_secret, self.team_name)
    }

    /// Returns a copy with a different team name.
    #[must_use]
    pub fn with_team_name(self, team_name: Option<String>) -> Self {
        Self::new(self.client_id, self.client_secret, team_name)
    }

    /// Returns true if both halves of the consumer credential are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Returns the consumer pair the provider client signs with.
    #[must_use]
    pub fn client_credentials(&self) -> ClientCredentials {
        ClientCredentials::new(self.client_id.clone(), self.client_secret.clone())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("team_name", &self.team_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_and_blanks_team() {
        let credentials = Credentials::new("  key1 ", "secret1\n", Some("   ".to_string()));
        assert_eq!(credentials.client_id(), "key1");
        assert_eq!(credentials.client_secret(), "secret1");
        assert_eq!(credentials.team_name(), None);
    }

    #[test]
    fn is_complete_requires_id_and_secret() {
        assert!(Credentials::new("key1", "secret1", None).is_complete());
        assert!(!Credentials::new("key1", " ", Some("myteam".to_string())).is_complete());
    }

    #[test]
    fn with_methods_replace_one_field() {
        let credentials = Credentials::new("key1", "secret1", Some("myteam".to_string()))
            .with_team_name(Some(" otherteam ".to_string()))
            .with_client_id("key2");
        assert_eq!(credentials.client_id(), "key2");
        assert_eq!(credentials.client_secret(), "secret1");
        assert_eq!(credentials.team_name(), Some("otherteam"));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", Credentials::new("key1", "secret1", None));
        assert!(rendered.contains("key1"));
        assert!(!rendered.contains("secret1"));
    }

    #[test]
    fn deserialization_normalizes() {
        let credentials: Credentials = serde_json::from_str(
            r#"{"client_id": " key1 ", "client_secret": "secret1", "team_name": ""}"#,
        )
        .expect("deserialize");
        assert_eq!(credentials.client_id(), "key1");
        assert_eq!(credentials.team_name(), None);
    }

    #[test]
    fn client_credentials_carry_consumer_pair() {
        let pair = Credentials::new("key1", "secret1", None).client_credentials();
        assert_eq!(pair.client_id(), "key1");
        assert_eq!(pair.client_secret(), "secret1");
    }
}
