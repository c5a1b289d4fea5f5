//! Storage Layer
//!
//! Handles all data persistence: the key/value boundary, the SQLite
//! database behind it, the persisted partitions, and the JSON config.

pub mod config;
pub mod database;
pub mod kv;
pub mod persistence;

pub use config::*;
pub use database::*;
pub use kv::*;
pub use persistence::*;
