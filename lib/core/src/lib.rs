//! Shared foundation types for the Bitbucket OAuth realm.
//!
//! This crate carries only what every other crate in the workspace needs:
//! the rootcause-backed `Result` alias and the interactive session identifier.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, SessionId};
