//! Authentication objects and the per-request security context.
//!
//! The host may hold authentication objects produced by other mechanisms
//! (anonymous access, API passwords). The realm only recognizes the session
//! principals its own login flow produced. The current principal is always
//! passed in explicitly as a [`SecurityContext`]; there is no global.

use crate::session::SessionAuthentication;

/// An authentication object as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// No user is logged in.
    Anonymous,
    /// Username/password credentials from some other mechanism.
    Password { username: String },
    /// A principal produced by this realm's login flow.
    Session(Box<SessionAuthentication>),
}

impl Authentication {
    /// Short name of the variant, for logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Password { .. } => "password",
            Self::Session(_) => "bitbucket-session",
        }
    }

    /// Returns the realm session principal, if that is what this is.
    #[must_use]
    pub fn as_session(&self) -> Option<&SessionAuthentication> {
        match self {
            Self::Session(session) => Some(session),
            _ => None,
        }
    }
}

impl From<SessionAuthentication> for Authentication {
    fn from(session: SessionAuthentication) -> Self {
        Self::Session(Box::new(session))
    }
}

/// The authentication bound to one interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    /// Creates a context with nothing bound.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a context holding `authentication`.
    #[must_use]
    pub fn with(authentication: Authentication) -> Self {
        Self {
            authentication: Some(authentication),
        }
    }

    /// Returns the bound authentication, if any.
    #[must_use]
    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    /// Returns the bound realm principal, if that is what is bound.
    #[must_use]
    pub fn session(&self) -> Option<&SessionAuthentication> {
        self.authentication.as_ref().and_then(Authentication::as_session)
    }

    /// Replaces whatever is bound.
    pub fn bind(&mut self, authentication: Authentication) {
        self.authentication = Some(authentication);
    }

    /// Drops the bound authentication.
    pub fn clear(&mut self) {
        self.authentication = None;
    }
}
