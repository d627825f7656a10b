//! Browser endpoints of the login flow.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{
        HeaderMap, StatusCode,
        header::{LOCATION, REFERER},
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use bitbucket_oauth_realm::{FinishOutcome, FlowCorrelation, SecurityContext, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::Duration as TimeDuration;
use tracing::{debug, info};

use super::{
    AppState, CurrentContext, OptionalAuth, RequireAuth, SESSION_COOKIE, session_id,
    store::InteractiveSession,
};
use crate::error::LoginError;

/// Query parameters of the provider callback.
#[derive(Debug, Deserialize)]
pub struct FinishLoginQuery {
    oauth_verifier: Option<String>,
}

/// The bound principal as reported by `whoami`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub display_name: Option<String>,
    pub authorities: Vec<String>,
}

/// A provider user as reported by the user lookup.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDetails {
    pub username: String,
    pub display_name: Option<String>,
}

impl From<UserProfile> for UserDetails {
    fn from(profile: UserProfile) -> Self {
        Self {
            username: profile.username().to_string(),
            display_name: profile.display_name().map(str::to_string),
        }
    }
}

/// A `302 Found` pointing at `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Starts a login by redirecting to the provider's authorization page.
pub async fn commence_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, LoginError> {
    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    let (id, handle) = state.sessions.get_or_create(session_id(&jar)).await;

    let authorize = {
        let mut session = handle.lock().await;
        state.flow.commence(&mut session.correlation, referer).await?
    };

    Ok((jar.add(state.session_cookie(id)), found(authorize.as_str())))
}

/// Handles the provider callback. Always answers with a redirect.
///
/// A completed login moves the session to a fresh id and re-issues the
/// cookie; the id used before login stops resolving.
pub async fn finish_login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FinishLoginQuery>,
    jar: CookieJar,
) -> Response {
    let verifier = query.oauth_verifier.as_deref();

    let current = match session_id(&jar) {
        Some(id) => state.sessions.get(&id).await.map(|handle| (id, handle)),
        None => None,
    };

    let Some((id, handle)) = current else {
        debug!("callback without a live session");
        let outcome = state
            .flow
            .finish(
                &mut FlowCorrelation::default(),
                &mut SecurityContext::empty(),
                verifier,
            )
            .await;
        return found(outcome.redirect());
    };

    let mut guard = handle.lock().await;
    let session = &mut *guard;
    let outcome = state
        .flow
        .finish(&mut session.correlation, &mut session.context, verifier)
        .await;

    let (redirect, profile) = match outcome {
        FinishOutcome::Complete { redirect, profile } => (redirect, profile),
        FinishOutcome::Failed { redirect, .. } => return found(&redirect),
    };

    let authenticated = InteractiveSession {
        context: std::mem::take(&mut session.context),
        ..InteractiveSession::default()
    };
    let new_id = state.sessions.rotate(&id, authenticated).await;
    drop(guard);

    let user = state.users.record_login(&profile).await;
    info!(username = %user.username(), "user logged in");

    (jar.add(state.session_cookie(new_id)), found(&redirect)).into_response()
}

/// Drops the session and its principal.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(id) = session_id(&jar) {
        state.sessions.remove(&id).await;
    }

    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), found(&state.flow.root_redirect()))
}

/// Reports the bound principal.
pub async fn whoami(RequireAuth(session): RequireAuth) -> Json<Principal> {
    let profile = session.profile();
    Json(Principal {
        username: session.principal_name().unwrap_or_default().to_string(),
        display_name: profile
            .and_then(UserProfile::display_name)
            .map(str::to_string),
        authorities: session
            .authorities()
            .iter()
            .map(|a| a.as_str().to_string())
            .collect(),
    })
}

/// Looks up a provider user on behalf of the session's principal.
pub async fn lookup_user(
    State(state): State<Arc<AppState>>,
    CurrentContext(context): CurrentContext,
    Path(username): Path<String>,
) -> Response {
    match state.realm().load_user_by_username(&context, &username).await {
        Ok(profile) => Json(UserDetails::from(profile)).into_response(),
        Err(e) => {
            debug!(error = %e, "user lookup failed");
            (StatusCode::NOT_FOUND, "No such user").into_response()
        }
    }
}

/// Minimal landing page.
pub async fn home(
    State(state): State<Arc<AppState>>,
    OptionalAuth(session): OptionalAuth,
) -> String {
    match session.as_ref().and_then(|s| s.profile()) {
        Some(profile) => format!("Signed in as {}", profile.full_name()),
        None => format!("Not signed in. Log in at /{}", state.realm().login_url()),
    }
}
