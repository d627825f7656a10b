//! Granted authorities consumed by the host's authorization layer.
//!
//! This realm only ever grants [`Authority::authenticated`]; team membership
//! is an all-or-nothing login gate, not a group the host can grant on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A permission or role attached to a resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(String);

impl Authority {
    /// Name of the authority every logged-in user holds.
    pub const AUTHENTICATED: &'static str = "authenticated";

    /// Creates an authority with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The authority granted to every successfully resolved user.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::new(Self::AUTHENTICATED)
    }

    /// Returns the authority name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of authorities held by one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthoritySet(BTreeSet<Authority>);

impl AuthoritySet {
    /// Creates an empty set (no access).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates the set granted to a resolved user.
    #[must_use]
    pub fn authenticated() -> Self {
        std::iter::once(Authority::authenticated()).collect()
    }

    /// Returns true if the set holds `authority`.
    #[must_use]
    pub fn contains(&self, authority: &Authority) -> bool {
        self.0.contains(authority)
    }

    /// Returns true if no authority is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of authorities held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the authorities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Authority> {
        self.0.iter()
    }
}

impl FromIterator<Authority> for AuthoritySet {
    fn from_iter<I: IntoIterator<Item = Authority>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
