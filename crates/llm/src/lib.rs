//! Prompt Studio LLM
//!
//! Provides a unified interface for the generative-AI provider used by the
//! prompt editor (Google Gemini), its SSE streaming adapter, and the HTTP
//! client factory.

pub mod gemini;
pub mod http_client;
pub mod provider;
pub mod streaming_adapters;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use provider::LlmProvider;
pub use types::*;

// Re-export streaming adapters
pub use streaming_adapters::GeminiAdapter;
