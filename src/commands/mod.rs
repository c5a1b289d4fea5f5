//! Commands
//!
//! Command handlers callable by the host, plus the `invoke` dispatcher that
//! routes a command name and JSON arguments to them. Every handler returns
//! a `CommandResponse`; errors never escape as panics or `Err`.

pub mod ai;
pub mod blocks;
pub mod import_export;
pub mod invoke;
pub mod prompts;
pub mod settings;

pub use invoke::{dispatch, is_long_running, COMMANDS};
