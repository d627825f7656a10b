//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`ProviderConfig`](bitbucket_oauth_provider::ProviderConfig) for the
//! identity provider endpoints and [`persisted`] for the credentials file
//! format.

use bitbucket_oauth_provider::ProviderConfig;
use bitbucket_oauth_realm::{Credentials, persisted};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Externally visible base URL; the login callback is built from it.
    #[serde(default)]
    pub root_url: Option<String>,

    /// Realm credentials given inline (`REALM__CLIENT_ID` etc.).
    #[serde(default)]
    pub realm: Option<Credentials>,

    /// Persisted credentials record; takes precedence over `realm`.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Identity provider endpoints.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity after which an interactive session is dropped.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Longest accepted idle timeout: one year.
pub const MAX_IDLE_TIMEOUT_MINUTES: i64 = 525_600;

fn default_idle_timeout_minutes() -> i64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    /// Checks the values the session store and cleanup task rely on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSession` if the idle timeout is not
    /// between one minute and [`MAX_IDLE_TIMEOUT_MINUTES`], or the cleanup
    /// interval is zero.
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if !(1..=MAX_IDLE_TIMEOUT_MINUTES).contains(&self.idle_timeout_minutes) {
            return Err(ConfigError::InvalidSession {
                reason: format!(
                    "idle_timeout_minutes must be between 1 and {MAX_IDLE_TIMEOUT_MINUTES}, got {}",
                    self.idle_timeout_minutes
                ),
            }
            .into());
        }
        if self.cleanup_interval_seconds == 0 {
            return Err(ConfigError::InvalidSession {
                reason: "cleanup_interval_seconds must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Loads configuration from an arbitrary source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or deserialized.
    pub fn load<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Resolves the realm credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the credentials file cannot be read or
    /// decoded, or if no complete credentials are configured.
    pub fn credentials(&self) -> Result<Credentials, Report<ConfigError>> {
        let credentials = match (&self.credentials_file, &self.realm) {
            (Some(path), _) => {
                let payload =
                    std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                persisted::decode(&payload).map_err(|e| {
                    e.context(ConfigError::InvalidCredentials {
                        path: path.display().to_string(),
                    })
                })?
            }
            (None, Some(credentials)) => credentials.clone(),
            (None, None) => return Err(ConfigError::MissingCredentials.into()),
        };

        if !credentials.is_complete() {
            return Err(ConfigError::MissingCredentials.into());
        }
        Ok(credentials)
    }
}
