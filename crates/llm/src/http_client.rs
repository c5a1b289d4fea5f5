//! HTTP Client Factory
//!
//! Builds the `reqwest::Client` shared by providers.

use crate::types::{LlmError, LlmResult};

const USER_AGENT: &str = concat!("prompt-studio/", env!("CARGO_PKG_VERSION"));

/// Build a `reqwest::Client` for provider calls.
///
/// No request timeout is set: streamed generations can legitimately run for
/// minutes and are cancelled by the caller instead.
pub fn build_http_client() -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| LlmError::NetworkError {
            message: format!("failed to build HTTP client: {}", e),
        })
}
