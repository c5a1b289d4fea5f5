//! Prompt Studio - Rust Backend Library
//!
//! Backend for a block-based prompt editor. It includes:
//! - The prompt store and its block editing operations
//! - Persistence to a key/value store (SQLite), with legacy migration
//! - JSON import and export
//! - Gemini-backed AI features, streamed where the UI shows progress
//! - Command handlers and the `invoke` dispatcher used by the host binary

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use commands::{dispatch, is_long_running, COMMANDS};
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::{AppEvent, AppState};
pub use utils::error::{AppError, AppResult};
