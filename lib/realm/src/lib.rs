//! Bitbucket OAuth security realm.
//!
//! This crate provides:
//! - Operator credentials and their persisted form (`Credentials`, [`persisted`])
//! - Identity resolution with the team membership check (`IdentityResolver`)
//! - The session principal and its authorities (`SessionAuthentication`, `AuthoritySet`)
//! - The two-legged login flow (`LoginFlow`, `FlowCorrelation`)
//! - The host-facing entry point (`Realm`)
//!
//! # Access Control Model
//!
//! A user may log in only if Bitbucket lists them as a member of the one team
//! named in the realm credentials. Members are granted the single
//! `authenticated` authority. Groups are not modelled.
//!
//! # Example
//!
//! ```
//! use bitbucket_oauth_realm::{Authority, AuthoritySet, Credentials, UserProfile};
//!
//! let credentials = Credentials::new(" key1 ", "secret1", Some("myteam".to_string()));
//! assert_eq!(credentials.client_id(), "key1");
//!
//! let profile = UserProfile::new("alice", None, AuthoritySet::authenticated());
//! assert!(profile.authorities().contains(&Authority::authenticated()));
//! assert_eq!(profile.full_name(), "alice");
//! ```

pub mod authority;
pub mod context;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod persisted;
pub mod profile;
pub mod realm;
pub mod resolver;
pub mod session;
pub mod user;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use authority::{Authority, AuthoritySet};
pub use context::{Authentication, SecurityContext};
pub use credentials::Credentials;
pub use error::{AuthenticationError, CredentialsError, FlowError, RealmError};
pub use flow::{FinishOutcome, FlowCorrelation, FlowState, LoginFlow};
pub use profile::UserProfile;
pub use realm::{FINISH_LOGIN_PATH, LOGIN_PATH, Realm};
pub use resolver::IdentityResolver;
pub use session::SessionAuthentication;
pub use user::User;
