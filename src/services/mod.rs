//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by commands.

pub mod ai;
pub mod block_stream;
pub mod gallery;
pub mod import_export;
pub mod store;

pub use ai::{AiGenerationState, AiService, GeminiFactory, ProviderFactory};
pub use block_stream::{BlockStream, Section, SectionParser};
pub use import_export::ImportReport;
pub use store::PromptStore;
