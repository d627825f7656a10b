//! Bitbucket identity provider client.
//!
//! This crate provides:
//! - OAuth 1.0a request signing (`oauth1`)
//! - Consumer credentials and request/access token types (`token`)
//! - Provider endpoint configuration with Bitbucket defaults (`config`)
//! - The `IdentityProvider` seam and its reqwest-backed `BitbucketClient`
//!
//! # Example
//!
//! ```
//! use bitbucket_oauth_provider::{
//!     BitbucketClient, ClientCredentials, IdentityProvider, ProviderConfig, RequestToken,
//! };
//!
//! let client = BitbucketClient::new(
//!     ClientCredentials::new("key1", "secret1"),
//!     &ProviderConfig::default(),
//! )
//! .expect("valid configuration");
//!
//! // Building the authorization URL never touches the network.
//! let url = client.create_authorization_url(&RequestToken::new("abc", "def"));
//! assert_eq!(
//!     url.as_str(),
//!     "https://bitbucket.org/api/1.0/oauth/authenticate?oauth_token=abc"
//! );
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod oauth1;
pub mod profile;
pub mod token;

pub use client::{BitbucketClient, IdentityProvider};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use profile::ProviderUser;
pub use token::{AccessToken, ClientCredentials, RequestToken};
