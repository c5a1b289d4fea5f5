//! Utilities
//!
//! Common utilities used throughout the application.

pub mod debounce;
pub mod error;
pub mod id;
pub mod json;
pub mod paths;
pub mod tokens;

pub use error::*;
pub use paths::*;
