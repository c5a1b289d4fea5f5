//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod block;
pub mod document;
pub mod prompt;
pub mod response;
pub mod settings;

pub use block::*;
pub use document::*;
pub use prompt::*;
pub use response::*;
pub use settings::*;
