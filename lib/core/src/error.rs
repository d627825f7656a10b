//! Error handling foundation for the realm workspace.
//!
//! Only the `Result` alias lives here. Each crate defines its own domain
//! error enums and returns them wrapped in a rootcause `Report`, adding
//! layer-appropriate context as errors propagate.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
