//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use bitbucket_oauth_realm::{SecurityContext, SessionAuthentication};
use std::sync::Arc;
use tracing::debug;

use super::{AppState, current_session};

/// Extractor for the security context of the request's session.
///
/// Yields an empty context when there is no live session.
pub struct CurrentContext(pub SecurityContext);

impl<S> FromRequestParts<S> for CurrentContext
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let context = match current_session(&app_state, &jar).await {
            Some(handle) => {
                let session = handle.lock().await;
                session.context.clone()
            }
            None => SecurityContext::empty(),
        };
        Ok(CurrentContext(context))
    }
}

/// Extractor for requiring a principal established through the realm.
pub struct RequireAuth(pub SessionAuthentication);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let Ok(CurrentContext(context)) = CurrentContext::from_request_parts(parts, state).await;

        let authentication = context
            .authentication()
            .cloned()
            .ok_or(AuthRejection::NotAuthenticated)?;

        let session = app_state
            .realm()
            .authenticate(authentication)
            .map_err(|e| {
                debug!(error = %e, "session principal rejected by realm");
                AuthRejection::NotAuthenticated
            })?;

        Ok(RequireAuth(session))
    }
}

/// Extractor for optionally getting the realm principal.
///
/// Returns None if the user is not authenticated.
pub struct OptionalAuth(pub Option<SessionAuthentication>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(session)) => Ok(OptionalAuth(Some(session))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated").into_response(),
        }
    }
}
