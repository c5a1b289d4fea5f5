//! LLM Provider Trait
//!
//! The seam between the AI service and a concrete model API, plus the
//! mapping from HTTP failures to `LlmError`.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::types::{LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig};
use prompt_studio_core::streaming::UnifiedStreamEvent;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider id used in logs
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// One request, one complete reply
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse>;

    /// Stream the reply as `TextDelta` / `ThinkingDelta` events on `tx`.
    /// The returned response holds the accumulated text once the stream
    /// ends. A closed receiver does not abort the request.
    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tx: mpsc::Sender<UnifiedStreamEvent>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse>;

    /// Cheap call that fails when the key is rejected or the API unreachable
    async fn health_check(&self) -> LlmResult<()>;

    fn config(&self) -> &ProviderConfig;

    /// Model ids the key can use; `None` when the provider cannot list them
    async fn list_models(&self) -> LlmResult<Option<Vec<String>>> {
        Ok(None)
    }
}

pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// `{"error": {"code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED", "details": [...]}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ErrorBody {
    /// `RetryInfo.retryDelay` ("23s") in whole seconds
    fn retry_after(&self) -> Option<u32> {
        self.details
            .iter()
            .filter_map(|d| d.get("retryDelay")?.as_str())
            .find_map(|delay| delay.trim_end_matches('s').parse::<f64>().ok())
            .map(|secs| secs.ceil() as u32)
    }
}

/// Map a non-200 reply for `model` to an `LlmError`.
///
/// The API's own error message is used when the body is the usual error
/// envelope; otherwise the raw body is kept.
pub fn parse_http_error(status: u16, body: &str, model: &str) -> LlmError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .ok();
    let message = parsed
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let api_status = parsed.as_ref().map(|e| e.status.as_str()).unwrap_or("");

    match status {
        // a rejected key comes back as 400 INVALID_ARGUMENT
        400 if message.contains("API key not valid") || body.contains("API_KEY_INVALID") => {
            LlmError::AuthenticationFailed { message }
        }
        401 | 403 => LlmError::AuthenticationFailed { message },
        404 => LlmError::ModelNotFound {
            model: model.to_string(),
        },
        429 => LlmError::RateLimited {
            retry_after: parsed.as_ref().and_then(ErrorBody::retry_after),
            message,
        },
        400 => LlmError::InvalidRequest { message },
        500..=599 => LlmError::ServerError {
            message,
            status: Some(status),
        },
        _ if !api_status.is_empty() => LlmError::Other {
            message: format!("{} ({}): {}", status, api_status, message),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, message),
        },
    }
}
