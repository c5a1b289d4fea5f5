//! Prompt Studio Core
//!
//! Stream events shared by the provider crate and the application. Kept free
//! of storage, HTTP and command code so both sides can depend on it.

pub mod streaming;

pub use streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};
