//! AI Service
//!
//! The AI features of the editor, each a thin wrapper that builds an
//! instruction from the user's input and sends it to the provider:
//!
//! - block improvement and one-shot prompt generation (single response)
//! - streamed prompt creation into an `AiGenerationState`
//! - streamed paraphrasing and JSON building
//! - JSON config extraction from source code
//!
//! Streams run on a spawned task and are read through `ActiveStream`, which
//! honours a `CancellationToken`. Nothing here touches the prompt store.

pub mod prompts;
pub mod session;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use prompt_studio_core::streaming::UnifiedStreamEvent;
use prompt_studio_llm::{
    GeminiProvider, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message,
    ProviderConfig,
};

use crate::models::block::{Block, BlockType};
use crate::models::prompt::Prompt;
use crate::models::response::user_message;
use crate::models::settings::{available_models, AiSettings};
use crate::services::block_stream::SectionParser;
use crate::utils::error::{AppError, AppResult};
use crate::utils::json::clean_json_string;

pub use prompts::{
    final_variations, split_variations, JsonBuilderKind, JsonConfigKind, ParaphraseMode,
    DEFAULT_VARIATIONS, MAX_VARIATIONS, MIN_VARIATIONS, VARIATION_SEPARATOR,
};
pub use session::AiGenerationState;

pub const MISSING_API_KEY_MESSAGE: &str =
    "Please set your Gemini API key in the Settings page to use this feature.";
pub const EMPTY_REQUIREMENTS_MESSAGE: &str = "Please describe the prompt you want to create.";
pub const EMPTY_PARAPHRASE_MESSAGE: &str = "Please enter some text to paraphrase.";
pub const EMPTY_CUSTOM_INSTRUCTION_MESSAGE: &str = "Please provide a custom instruction.";
pub const EMPTY_JSON_DESCRIPTION_MESSAGE: &str =
    "Please provide a description for the JSON you want to build.";
pub const EMPTY_SOURCE_MESSAGE: &str = "Please paste some source code to analyze.";
pub const EMPTY_IMPROVE_MESSAGE: &str = "There is no text to improve.";
pub const INVALID_FORMAT_MESSAGE: &str =
    "The AI returned data in an invalid format. Please try again.";
pub const INVALID_JSON_MESSAGE: &str =
    "The AI returned data in an invalid JSON format. Please try again.";
pub const INVALID_JSON_REVIEW_MESSAGE: &str =
    "The AI returned data in an invalid JSON format. Please review the output.";
pub const INVALID_CONFIG_JSON_MESSAGE: &str =
    "The AI returned data in an invalid JSON format. Please try again or adjust your source code input.";

const STREAM_CHANNEL_CAPACITY: usize = 64;

fn require_text(text: &str, message: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(())
}

pub fn validate_requirements(requirements: &str) -> AppResult<()> {
    require_text(requirements, EMPTY_REQUIREMENTS_MESSAGE)
}

/// Builds the provider for the current AI settings
pub trait ProviderFactory: Send + Sync {
    fn create(&self, settings: &AiSettings) -> AppResult<Arc<dyn LlmProvider>>;
}

/// Factory for the Gemini REST provider
#[derive(Debug, Clone, Default)]
pub struct GeminiFactory {
    base_url: Option<String>,
}

impl GeminiFactory {
    pub fn new(base_url: Option<String>) -> Self {
        Self { base_url }
    }
}

impl ProviderFactory for GeminiFactory {
    fn create(&self, settings: &AiSettings) -> AppResult<Arc<dyn LlmProvider>> {
        let config = ProviderConfig {
            api_key: Some(settings.api_key.clone()),
            model: settings.model.clone(),
            base_url: self.base_url.clone(),
            temperature: Some(settings.temperature),
            top_p: Some(settings.top_p),
            max_output_tokens: None,
        };
        Ok(Arc::new(GeminiProvider::new(config)?))
    }
}

/// A provider stream running on its own task
struct ActiveStream {
    rx: mpsc::Receiver<UnifiedStreamEvent>,
    handle: Option<JoinHandle<LlmResult<LlmResponse>>>,
    cancel: CancellationToken,
}

impl ActiveStream {
    /// Next event, `None` once the provider has stopped sending
    async fn next_event(&mut self) -> AppResult<Option<UnifiedStreamEvent>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AppError::Cancelled),
            event = self.rx.recv() => Ok(event),
        }
    }

    /// Wait for the provider's final result
    async fn finish(mut self) -> AppResult<LlmResponse> {
        let Some(mut handle) = self.handle.take() else {
            return Err(AppError::internal("stream already finished"));
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                handle.abort();
                Err(AppError::Cancelled)
            }
            joined = &mut handle => match joined {
                Ok(result) => Ok(result?),
                Err(e) => Err(AppError::internal(format!("stream task failed: {}", e))),
            },
        }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Paraphrase tool input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParaphraseRequest {
    #[serde(default)]
    pub mode: ParaphraseMode,
    #[serde(default)]
    pub custom_instruction: String,
    pub text: String,
    #[serde(default = "default_variations")]
    pub variations: u32,
}

fn default_variations() -> u32 {
    DEFAULT_VARIATIONS
}

impl ParaphraseRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_text(&self.text, EMPTY_PARAPHRASE_MESSAGE)?;
        if self.mode == ParaphraseMode::Custom {
            require_text(&self.custom_instruction, EMPTY_CUSTOM_INSTRUCTION_MESSAGE)?;
        }
        Ok(())
    }

    pub fn variation_count(&self) -> u32 {
        self.variations.clamp(MIN_VARIATIONS, MAX_VARIATIONS)
    }
}

/// Final output of the JSON builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBuildOutput {
    /// Pretty-printed JSON, or the cleaned raw text when it did not parse
    pub json: String,
    pub valid: bool,
    pub error: Option<String>,
}

impl JsonBuildOutput {
    pub fn from_raw(raw: &str) -> Self {
        let cleaned = clean_json_string(raw);
        match pretty_json(&cleaned) {
            Some(json) => Self {
                json,
                valid: true,
                error: None,
            },
            None => {
                tracing::warn!("[AI] JSON builder output did not parse");
                Self {
                    json: cleaned,
                    valid: false,
                    error: Some(INVALID_JSON_REVIEW_MESSAGE.to_string()),
                }
            }
        }
    }
}

fn pretty_json(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Turn the one-shot generation reply into a prompt.
///
/// Expects `{ name, blocks: [{ type, content }] }`. Blocks with a type
/// outside the block set are skipped; a reply left with no blocks is an
/// invalid format.
pub fn parse_generated_prompt(raw: &str) -> AppResult<Prompt> {
    let cleaned = clean_json_string(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|_| AppError::validation(INVALID_JSON_MESSAGE))?;

    let invalid = || AppError::validation(INVALID_FORMAT_MESSAGE);
    let name = value.get("name").and_then(Value::as_str).ok_or_else(invalid)?;
    let items = value.get("blocks").and_then(Value::as_array).ok_or_else(invalid)?;

    let mut blocks = Vec::with_capacity(items.len());
    for item in items {
        let block_type = item.get("type").and_then(Value::as_str).ok_or_else(invalid)?;
        let content = item.get("content").and_then(Value::as_str).ok_or_else(invalid)?;
        match block_type.parse::<BlockType>() {
            Ok(block_type) => blocks.push(Block::with_content(block_type, content)),
            Err(e) => tracing::warn!("[AI] skipping generated block: {}", e),
        }
    }
    if blocks.is_empty() {
        return Err(invalid());
    }

    let mut prompt = Prompt::new(name);
    prompt.blocks = blocks;
    Ok(prompt)
}

/// AI features bound to one provider and one set of sampling settings
#[derive(Clone)]
pub struct AiService {
    provider: Arc<dyn LlmProvider>,
    settings: AiSettings,
}

impl AiService {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: AiSettings) -> Self {
        Self { provider, settings }
    }

    /// Build the service for `settings`; fails without an API key
    pub fn from_settings(factory: &dyn ProviderFactory, settings: &AiSettings) -> AppResult<Self> {
        if !settings.has_api_key() {
            return Err(AppError::validation(MISSING_API_KEY_MESSAGE));
        }
        Ok(Self::new(factory.create(settings)?, settings.clone()))
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    fn options(&self, json_output: bool, include_thoughts: bool) -> LlmRequestOptions {
        LlmRequestOptions {
            temperature: Some(self.settings.temperature),
            top_p: Some(self.settings.top_p),
            include_thoughts,
            json_output,
        }
    }

    async fn complete(&self, prompt: String, options: LlmRequestOptions) -> AppResult<String> {
        let response = self
            .provider
            .send_message(vec![Message::user(prompt)], None, options)
            .await?;
        tracing::debug!(
            "[AI] response: {} output tokens",
            response.usage.output_tokens
        );
        Ok(response.text().to_string())
    }

    fn open_stream(&self, prompt: String, options: LlmRequestOptions, cancel: &CancellationToken) -> ActiveStream {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let provider = Arc::clone(&self.provider);
        let handle = tokio::spawn(async move {
            provider
                .stream_message(vec![Message::user(prompt)], None, tx, options)
                .await
        });
        ActiveStream {
            rx,
            handle: Some(handle),
            cancel: cancel.clone(),
        }
    }

    /// Drive a stream to the end, handing each text delta to `on_text`.
    /// Returns the full text.
    async fn stream_text<F>(&self, prompt: String, options: LlmRequestOptions, cancel: &CancellationToken, mut on_text: F) -> AppResult<String>
    where
        F: FnMut(&str, &str),
    {
        let mut stream = self.open_stream(prompt, options, cancel);
        let mut full = String::new();
        while let Some(event) = stream.next_event().await? {
            match event {
                UnifiedStreamEvent::TextDelta { content } => {
                    full.push_str(&content);
                    on_text(&content, &full);
                }
                UnifiedStreamEvent::Error { message, .. } => {
                    tracing::warn!("[AI] stream error: {}", message);
                }
                _ => {}
            }
        }
        stream.finish().await?;
        Ok(full)
    }

    /// Rewrite a block's text as a clearer prompt block
    pub async fn improve_block_text(&self, text: &str) -> AppResult<String> {
        require_text(text, EMPTY_IMPROVE_MESSAGE)?;
        let improved = self.complete(prompts::improve_prompt(text), self.options(false, false)).await?;
        let improved = improved.trim();
        if improved.is_empty() {
            return Err(AppError::internal("The AI returned an empty response."));
        }
        Ok(improved.to_string())
    }

    /// One-shot generation of a complete prompt from requirements
    pub async fn generate_prompt(&self, requirements: &str) -> AppResult<Prompt> {
        validate_requirements(requirements)?;
        tracing::info!("[AI] generating prompt with {}", self.model());
        let raw = self
            .complete(prompts::generation_prompt(requirements), self.options(true, false))
            .await?;
        parse_generated_prompt(&raw)
    }

    /// Streamed generation into `session`.
    ///
    /// Completed sections land in the session as they arrive and
    /// `on_update` sees a snapshot after every text delta. On success the
    /// session is marked finished; on failure it keeps what was received
    /// plus the error message. Once `cancel` fires the session is no longer
    /// written, so whoever cancelled owns it.
    pub async fn stream_prompt_creation<F>(
        &self,
        requirements: &str,
        session: &RwLock<AiGenerationState>,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> AppResult<()>
    where
        F: FnMut(&AiGenerationState),
    {
        validate_requirements(requirements)?;
        {
            let mut state = session.write().await;
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            *state = AiGenerationState::start(requirements);
        }
        tracing::info!("[AI] streaming prompt creation with {}", self.model());

        let mut parser = SectionParser::new();
        let outcome = self
            .drive_creation(requirements, session, cancel, &mut parser, &mut on_update)
            .await;

        let mut state = session.write().await;
        if cancel.is_cancelled() {
            tracing::info!("[AI] generation cancelled");
            return Err(AppError::Cancelled);
        }
        match outcome {
            Ok(()) => {
                state.apply_sections(parser.finish());
                state.pending = None;
                state.is_generating = false;
                if state.generated_blocks.is_empty() {
                    state.error = Some(INVALID_FORMAT_MESSAGE.to_string());
                    return Err(AppError::validation(INVALID_FORMAT_MESSAGE));
                }
                state.is_finished = true;
                tracing::info!(
                    "[AI] generation finished with {} blocks",
                    state.generated_blocks.len()
                );
                Ok(())
            }
            Err(e) => {
                state.is_generating = false;
                state.pending = None;
                state.error = Some(user_message(&e));
                Err(e)
            }
        }
    }

    async fn drive_creation<F>(
        &self,
        requirements: &str,
        session: &RwLock<AiGenerationState>,
        cancel: &CancellationToken,
        parser: &mut SectionParser,
        on_update: &mut F,
    ) -> AppResult<()>
    where
        F: FnMut(&AiGenerationState),
    {
        let mut stream = self.open_stream(
            prompts::creation_stream_prompt(requirements),
            self.options(false, true),
            cancel,
        );
        while let Some(event) = stream.next_event().await? {
            match event {
                UnifiedStreamEvent::TextDelta { content } => {
                    let completed = parser.feed(&content);
                    let mut state = session.write().await;
                    if cancel.is_cancelled() {
                        return Err(AppError::Cancelled);
                    }
                    state.raw_content.push_str(&content);
                    state.apply_sections(completed);
                    state.pending = parser.pending();
                    on_update(&*state);
                }
                UnifiedStreamEvent::ThinkingDelta { content } => {
                    let mut state = session.write().await;
                    if cancel.is_cancelled() {
                        return Err(AppError::Cancelled);
                    }
                    state.thoughts.push_str(&content);
                }
                UnifiedStreamEvent::Error { message, .. } => {
                    tracing::warn!("[AI] stream error: {}", message);
                }
                _ => {}
            }
        }
        stream.finish().await?;
        Ok(())
    }

    /// Streamed paraphrase; `on_update` sees the variations so far
    pub async fn stream_paraphrase<F>(&self, request: &ParaphraseRequest, cancel: &CancellationToken, mut on_update: F) -> AppResult<Vec<String>>
    where
        F: FnMut(&[String]),
    {
        request.validate()?;
        let prompt = prompts::paraphrase_prompt(
            request.mode,
            &request.custom_instruction,
            &request.text,
            request.variation_count(),
        );
        let full = self
            .stream_text(prompt, self.options(false, false), cancel, |_, full| {
                on_update(&split_variations(full));
            })
            .await?;
        Ok(final_variations(&full))
    }

    /// Streamed JSON builder; `on_chunk` sees each text delta
    pub async fn stream_json_builder<F>(&self, kind: JsonBuilderKind, description: &str, cancel: &CancellationToken, mut on_chunk: F) -> AppResult<JsonBuildOutput>
    where
        F: FnMut(&str),
    {
        require_text(description, EMPTY_JSON_DESCRIPTION_MESSAGE)?;
        let full = self
            .stream_text(
                prompts::json_builder_prompt(kind, description),
                self.options(false, false),
                cancel,
                |chunk, _| on_chunk(chunk),
            )
            .await?;
        Ok(JsonBuildOutput::from_raw(&full))
    }

    /// Extract a design or architecture config from source code
    pub async fn generate_json_config(&self, kind: JsonConfigKind, source: &str) -> AppResult<String> {
        require_text(source, EMPTY_SOURCE_MESSAGE)?;
        let raw = self
            .complete(prompts::json_config_prompt(kind, source), self.options(true, false))
            .await?;
        pretty_json(&clean_json_string(&raw))
            .ok_or_else(|| AppError::validation(INVALID_CONFIG_JSON_MESSAGE))
    }

    /// Model ids offered by the provider, or the built-in catalogue
    pub async fn list_models(&self) -> AppResult<Vec<String>> {
        match self.provider.list_models().await? {
            Some(models) if !models.is_empty() => Ok(models),
            _ => Ok(available_models().into_iter().map(|m| m.id).collect()),
        }
    }
}
