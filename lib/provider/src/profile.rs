//! Provider-side user records.
//!
//! The REST API wraps each user (and each team, which is modelled as a user
//! account) in an envelope: `{"user": {"username": "...", ...}}`.

use serde::{Deserialize, Serialize};

/// A user (or team) account as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Account name, unique on the provider. Teams use this as their identifier.
    pub username: String,
    /// Human-readable name, if the account has one.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ProviderUser {
    /// Creates a record with no display name.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }
}

/// The `{"user": {...}}` wrapper used by `user`, `users/{name}` and `teams`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserEnvelope {
    #[serde(default)]
    pub(crate) user: Option<ProviderUser>,
}

/// Parses a single-user response; `null`, empty bodies and envelopes without
/// a `user` record all mean "no profile".
pub(crate) fn parse_user(body: &str) -> Result<Option<ProviderUser>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: Option<UserEnvelope> = serde_json::from_str(body)?;
    Ok(envelope.and_then(|e| e.user))
}

/// Parses a teams listing into team identifiers.
pub(crate) fn parse_team_names(body: &str) -> Result<Vec<String>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let teams: Option<Vec<UserEnvelope>> = serde_json::from_str(body)?;
    Ok(teams
        .unwrap_or_default()
        .into_iter()
        .filter_map(|team| team.user.map(|u| u.username))
        .collect())
}
