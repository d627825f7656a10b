//! Domain error types for server operations.
//!
//! Handlers log the full report server-side and hand the browser a short,
//! user-safe message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bitbucket_oauth_realm::FlowError;
use rootcause::prelude::Report;
use std::fmt;

/// Errors resolving the server's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The credentials file could not be read.
    Unreadable { path: String, reason: String },
    /// The credentials file is not a valid credentials record.
    InvalidCredentials { path: String },
    /// No client id and secret are configured.
    MissingCredentials,
    /// A session setting is out of range.
    InvalidSession { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, reason } => {
                write!(f, "cannot read credentials file '{}': {}", path, reason)
            }
            Self::InvalidCredentials { path } => {
                write!(f, "invalid credentials file '{}'", path)
            }
            Self::MissingCredentials => {
                write!(f, "realm client id and client secret are not configured")
            }
            Self::InvalidSession { reason } => write!(f, "invalid session configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A login that could not be started.
///
/// Callback failures never surface here; they always end in a redirect.
#[derive(Debug)]
pub struct LoginError(pub Report<FlowError>);

impl From<Report<FlowError>> for LoginError {
    fn from(report: Report<FlowError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "login could not start");
        let (status, message) = match self.0.current_context() {
            FlowError::BaseUrlNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Login is not available: the server root URL is not configured",
            ),
            _ => (
                StatusCode::BAD_GATEWAY,
                "Login is not available: the identity provider could not be reached",
            ),
        };
        (status, message).into_response()
    }
}
