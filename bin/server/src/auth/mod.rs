//! Authentication module for the realm host.
//!
//! This module provides:
//! - The browser endpoints of the login flow (`/securityRealm/*`)
//! - Cookie-keyed interactive sessions with idle expiry
//! - Authentication extractors for Axum routes
//!
//! # Authorization Model
//!
//! Whether a user may log in at all is decided once, during the callback, by
//! the realm's team membership check. The resulting principal is kept in the
//! interactive session until logout or idle expiry; it is not re-checked
//! against the provider on later requests.

pub mod middleware;
pub mod routes;
pub mod store;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bitbucket_oauth_core::SessionId;
use bitbucket_oauth_realm::{LoginFlow, Realm};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::users::UserDirectory;

pub use middleware::{CurrentContext, OptionalAuth, RequireAuth};
pub use routes::{commence_login, finish_login, home, logout, lookup_user, whoami};
pub use store::{InteractiveSession, SessionHandle, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Shared application state.
pub struct AppState {
    /// Login flow bound to the configured realm.
    pub flow: LoginFlow,
    /// Interactive sessions.
    pub sessions: SessionStore,
    /// Host user records.
    pub users: UserDirectory,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// `session_config` is expected to have passed [`SessionConfig::validate`].
    pub fn new(realm: Realm, root_url: Option<String>, session_config: SessionConfig) -> Self {
        let idle_timeout = chrono::Duration::minutes(session_config.idle_timeout_minutes);
        Self {
            flow: LoginFlow::new(Arc::new(realm), root_url),
            sessions: SessionStore::new(idle_timeout),
            users: UserDirectory::new(),
            session_config,
        }
    }

    /// Returns the configured realm.
    pub fn realm(&self) -> &Realm {
        self.flow.realm()
    }

    /// Builds the cookie carrying `id`.
    ///
    /// The cookie has no `Max-Age`; the store's idle expiry decides how long
    /// the session lives.
    pub fn session_cookie(&self, id: SessionId) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.session_config.secure_cookies)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Reads the session id from the cookie jar, ignoring malformed values.
pub fn session_id(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)?.value().parse().ok()
}

/// Looks up the live session named by the request's cookie.
pub async fn current_session(state: &AppState, jar: &CookieJar) -> Option<SessionHandle> {
    let id = session_id(jar)?;
    state.sessions.get(&id).await
}
