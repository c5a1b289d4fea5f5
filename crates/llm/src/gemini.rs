//! Gemini Provider
//!
//! Implementation of the LlmProvider trait for the Google Generative Language
//! API (`generateContent` / `streamGenerateContent`).

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    StopReason, UsageStats,
};
use crate::http_client::build_http_client;
use crate::streaming_adapters::gemini::{GeminiChunk, UsageMetadata};
use crate::streaming_adapters::GeminiAdapter;
use prompt_studio_core::streaming::{StreamAdapter, UnifiedStreamEvent};

/// Default Gemini API endpoint
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client()?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_URL)
            .trim_end_matches('/')
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_api_key_error("gemini"))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url(), self.config.model, method)
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": match m.role {
                        MessageRole::User => "user",
                        MessageRole::Model => "model",
                    },
                    "parts": [{ "text": m.content }],
                })
            })
            .collect();

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = request_options.temperature.or(self.config.temperature) {
            generation_config.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(p) = request_options.top_p.or(self.config.top_p) {
            generation_config.insert("topP".into(), serde_json::json!(p));
        }
        if let Some(max) = self.config.max_output_tokens {
            generation_config.insert("maxOutputTokens".into(), serde_json::json!(max));
        }
        if request_options.json_output {
            generation_config.insert(
                "responseMimeType".into(),
                serde_json::json!("application/json"),
            );
        }
        if request_options.include_thoughts {
            generation_config.insert(
                "thinkingConfig".into(),
                serde_json::json!({ "includeThoughts": true }),
            );
        }

        let mut body = serde_json::json!({ "contents": contents });
        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }
        body
    }

    fn parse_response(&self, response: &GeminiChunk) -> LlmResponse {
        let mut content = String::new();
        let mut thinking = String::new();
        let mut stop_reason = StopReason::EndTurn;

        if let Some(candidate) = response.candidates.first() {
            if let Some(c) = &candidate.content {
                for part in &c.parts {
                    if let Some(text) = &part.text {
                        if part.thought {
                            thinking.push_str(text);
                        } else {
                            content.push_str(text);
                        }
                    }
                }
            }
            if let Some(reason) = &candidate.finish_reason {
                stop_reason = StopReason::from(reason.as_str());
            }
        }

        LlmResponse {
            content: (!content.is_empty()).then_some(content),
            thinking: (!thinking.is_empty()).then_some(thinking),
            stop_reason,
            usage: usage_stats(response.usage_metadata.as_ref()),
            model: self.config.model.clone(),
        }
    }
}

fn usage_stats(usage: Option<&UsageMetadata>) -> UsageStats {
    usage
        .map(|u| UsageStats {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            thinking_tokens: u.thoughts_token_count,
        })
        .unwrap_or_default()
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self.api_key()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        tracing::debug!("[Gemini] generateContent model={}", self.config.model);

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, &self.config.model));
        }

        let parsed: GeminiChunk =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        if let Some(error) = &parsed.error {
            return Err(LlmError::Other {
                message: error.message.clone(),
            });
        }

        Ok(self.parse_response(&parsed))
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tx: mpsc::Sender<UnifiedStreamEvent>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self.api_key()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        tracing::debug!("[Gemini] streamGenerateContent model={}", self.config.model);

        let response = self
            .client
            .post(format!("{}?alt=sse", self.endpoint("streamGenerateContent")))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            return Err(parse_http_error(status, &body_text, &self.config.model));
        }

        // Process SSE stream
        let mut adapter = GeminiAdapter::new();
        let mut accumulated_content = String::new();
        let mut accumulated_thinking = String::new();
        let mut usage = UsageStats::default();
        let mut stop_reason = StopReason::EndTurn;
        let mut stream_error: Option<LlmError> = None;

        let mut stream = response.bytes_stream();
        // raw bytes: a chunk may end inside a multi-byte character
        let mut buffer: Vec<u8> = Vec::new();

        let mut finished = false;

        while !finished {
            match stream.next().await {
                Some(chunk) => {
                    let chunk = chunk.map_err(|e| LlmError::NetworkError {
                        message: e.to_string(),
                    })?;
                    buffer.extend_from_slice(&chunk);
                }
                None => {
                    // flush a last event that arrived without its newline
                    finished = true;
                    if buffer.is_empty() {
                        break;
                    }
                    buffer.push(b'\n');
                }
            }

            // Process complete lines
            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&raw[..line_end]);

                if line.trim().is_empty() {
                    continue;
                }

                let events = match adapter.adapt(&line) {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::warn!("[Gemini] Dropping unparseable stream line: {}", e);
                        continue;
                    }
                };

                for event in events {
                    match &event {
                        UnifiedStreamEvent::TextDelta { content } => {
                            accumulated_content.push_str(content);
                        }
                        UnifiedStreamEvent::ThinkingDelta { content } => {
                            accumulated_thinking.push_str(content);
                        }
                        UnifiedStreamEvent::Usage {
                            input_tokens,
                            output_tokens,
                            thinking_tokens,
                        } => {
                            usage.input_tokens = *input_tokens;
                            usage.output_tokens = *output_tokens;
                            usage.thinking_tokens = *thinking_tokens;
                        }
                        UnifiedStreamEvent::Complete {
                            stop_reason: Some(reason),
                        } => {
                            stop_reason = StopReason::from(reason.as_str());
                        }
                        UnifiedStreamEvent::Error { message, .. } => {
                            stream_error = Some(LlmError::ServerError {
                                message: message.clone(),
                                status: None,
                            });
                        }
                        _ => {}
                    }

                    // A closed receiver means the caller abandoned the stream
                    if tx.send(event).await.is_err() {
                        tracing::debug!("[Gemini] Stream receiver dropped, stopping");
                        return Err(LlmError::Other {
                            message: "stream cancelled".to_string(),
                        });
                    }
                }
            }
        }

        if let Some(err) = stream_error {
            return Err(err);
        }

        Ok(LlmResponse {
            content: (!accumulated_content.is_empty()).then_some(accumulated_content),
            thinking: (!accumulated_thinking.is_empty()).then_some(accumulated_thinking),
            stop_reason,
            usage,
            model: self.config.model.clone(),
        })
    }

    async fn health_check(&self) -> LlmResult<()> {
        self.list_models().await.map(|_| ())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn list_models(&self) -> LlmResult<Option<Vec<String>>> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/models", self.base_url()))
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;
        if status != 200 {
            return Err(parse_http_error(status, &body, &self.config.model));
        }

        let list: ModelList = serde_json::from_str(&body).map_err(|e| LlmError::ParseError {
            message: format!("Failed to parse model list: {}", e),
        })?;

        Ok(Some(
            list.models
                .into_iter()
                .map(|m| m.name.trim_start_matches("models/").to_string())
                .collect(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}
