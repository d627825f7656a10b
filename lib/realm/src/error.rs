//! Error types for the realm crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: turning an access token into a session identity
//! - `FlowError`: the two-legged login redirect dance
//! - `RealmError`: calls the host makes into the realm
//! - `CredentialsError`: decoding persisted realm configuration
//!
//! Provider faults arrive as `Report<ProviderError>` and are wrapped with one
//! of these via `.context()`.

use std::fmt;

/// Errors from resolving an access token into a session identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No profile, or the profile is not a member of the required team.
    ///
    /// The two cases are deliberately not distinguished here.
    Unauthenticated,
    /// The provider failed while resolving the identity.
    ProviderFailure { step: &'static str },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "access token does not resolve to a permitted user"),
            Self::ProviderFailure { step } => {
                write!(f, "identity provider failed during {step}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The host's external base URL is not configured; no callback can be built.
    BaseUrlNotConfigured,
    /// Obtaining a request token failed.
    RequestTokenFailed,
    /// The callback carried no verifier code.
    MissingVerifier,
    /// The callback arrived in a session with no pending request token.
    NoPendingRequest,
    /// Exchanging the verifier for an access token failed.
    ExchangeFailed,
    /// The provider handed back an empty access token.
    EmptyAccessToken,
    /// The access token did not resolve to a permitted user.
    IdentityRejected,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseUrlNotConfigured => {
                write!(f, "root URL is not configured; login cannot start")
            }
            Self::RequestTokenFailed => write!(f, "failed to obtain a request token"),
            Self::MissingVerifier => write!(f, "callback carried no oauth_verifier"),
            Self::NoPendingRequest => {
                write!(f, "callback has no pending request token in this session")
            }
            Self::ExchangeFailed => write!(f, "failed to exchange verifier for access token"),
            Self::EmptyAccessToken => write!(f, "provider returned an empty access token"),
            Self::IdentityRejected => write!(f, "identity could not be established"),
        }
    }
}

impl std::error::Error for FlowError {}

/// Errors returned to the host by the realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealmError {
    /// The presented authentication was not produced by this realm's login flow.
    UnsupportedCredentialType { kind: String },
    /// A realm session whose identity was never resolved.
    UnresolvedIdentity,
    /// No such user, or the lookup was made outside a realm-backed session.
    NoSuchUser { username: String },
    /// Groups are not modelled by this realm.
    NoSuchGroup { group: String },
}

impl fmt::Display for RealmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCredentialType { kind } => {
                write!(f, "unexpected authentication type: {kind}")
            }
            Self::UnresolvedIdentity => write!(f, "session carries no resolved identity"),
            Self::NoSuchUser { username } => write!(f, "no such user: {username}"),
            Self::NoSuchGroup { group } => {
                write!(f, "groups are not supported (requested '{group}')")
            }
        }
    }
}

impl std::error::Error for RealmError {}

/// Errors from decoding persisted realm credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// The payload is not a readable record.
    Malformed { reason: String },
    /// The payload names a field the realm does not know.
    UnknownField { field: String },
    /// A required field is missing or blank.
    MissingField { field: &'static str },
    /// The record declares a format version this build cannot read.
    UnsupportedVersion { version: u32 },
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed credentials record: {reason}"),
            Self::UnknownField { field } => write!(f, "invalid credentials field: {field}"),
            Self::MissingField { field } => write!(f, "missing credentials field: {field}"),
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported credentials record version: {version}")
            }
        }
    }
}

impl std::error::Error for CredentialsError {}
