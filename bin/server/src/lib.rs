//! HTTP host for the Bitbucket OAuth security realm.
//!
//! This crate wires the realm into an Axum application: the login flow
//! endpoints under `/securityRealm/`, cookie-keyed interactive sessions, a
//! host user directory, and configuration loading.

pub mod auth;
pub mod config;
pub mod error;
pub mod users;

use axum::{Router, routing::get};
use bitbucket_oauth_realm::{FINISH_LOGIN_PATH, LOGIN_PATH};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::AppState;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route(&format!("/{LOGIN_PATH}"), get(auth::commence_login))
        .route(&format!("/{FINISH_LOGIN_PATH}"), get(auth::finish_login))
        .route("/securityRealm/logout", get(auth::logout))
        .route("/securityRealm/whoami", get(auth::whoami))
        .route("/securityRealm/user/{username}", get(auth::lookup_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
