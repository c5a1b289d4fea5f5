//! Gemini API Adapter
//!
//! Handles the SSE format of `streamGenerateContent?alt=sse`: every `data:`
//! line is a full `GenerateContentResponse` carrying the next slice of parts.

use prompt_studio_core::streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub thoughts_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Adapter for the Gemini SSE stream.
#[derive(Debug, Default)]
pub struct GeminiAdapter {
    last_usage: Option<UsageMetadata>,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn usage_event(usage: &UsageMetadata) -> UnifiedStreamEvent {
        UnifiedStreamEvent::Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            thinking_tokens: usage.thoughts_token_count,
        }
    }
}

impl StreamAdapter for GeminiAdapter {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<UnifiedStreamEvent>, AdapterError> {
        let line = input.trim();
        let Some(payload) = line.strip_prefix("data:") else {
            // `event:` / `id:` fields and `:` keep-alive comments carry nothing
            return Ok(Vec::new());
        };
        let payload = payload.trim();
        if payload.is_empty() || payload == "[DONE]" {
            return Ok(Vec::new());
        }

        let chunk: GeminiChunk = serde_json::from_str(payload)
            .map_err(|e| AdapterError::ParseError(format!("{}: {}", e, payload)))?;

        if let Some(error) = chunk.error {
            return Ok(vec![UnifiedStreamEvent::Error {
                message: error.message,
                code: error
                    .status
                    .or_else(|| error.code.map(|c| c.to_string())),
            }]);
        }

        if let Some(usage) = chunk.usage_metadata {
            self.last_usage = Some(usage);
        }

        let mut events = Vec::new();
        for candidate in chunk.candidates {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    let Some(text) = part.text.filter(|t| !t.is_empty()) else {
                        continue;
                    };
                    if part.thought {
                        events.push(UnifiedStreamEvent::ThinkingDelta { content: text });
                    } else {
                        events.push(UnifiedStreamEvent::TextDelta { content: text });
                    }
                }
            }

            if let Some(reason) = candidate.finish_reason {
                if let Some(usage) = &self.last_usage {
                    events.push(Self::usage_event(usage));
                }
                events.push(UnifiedStreamEvent::Complete {
                    stop_reason: Some(reason),
                });
            }
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.last_usage = None;
    }
}
