//! Error types for the provider crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ProviderError`: failures talking to the identity provider
//!
//! Flow-level context (which login step was running) is added by callers.

use std::fmt;

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not be reached or answered with an unexpected status.
    Unavailable { endpoint: String, reason: String },
    /// The provider rejected the verifier code / request token pair.
    InvalidGrant { reason: String },
    /// The provider answered, but the body could not be understood.
    MalformedResponse { endpoint: String, reason: String },
    /// Endpoint configuration is unusable (bad URL, HTTP client setup).
    Configuration { reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { endpoint, reason } => {
                write!(f, "provider unavailable at {endpoint}: {reason}")
            }
            Self::InvalidGrant { reason } => {
                write!(f, "provider rejected the authorization grant: {reason}")
            }
            Self::MalformedResponse { endpoint, reason } => {
                write!(f, "malformed response from {endpoint}: {reason}")
            }
            Self::Configuration { reason } => {
                write!(f, "provider configuration error: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display_names_endpoint() {
        let err = ProviderError::Unavailable {
            endpoint: "https://api.bitbucket.org/2.0/user".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("api.bitbucket.org/2.0/user"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn invalid_grant_display() {
        let err = ProviderError::InvalidGrant {
            reason: "HTTP 401".to_string(),
        };
        assert!(err.to_string().contains("rejected"));
        assert!(err.to_string().contains("HTTP 401"));
    }
}
